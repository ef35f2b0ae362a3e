use crate::schema::{CompanyRecord, FiscalConfig, PeriodKey};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CompanyTotals {
    pub purchases: f64,
    pub revenue: f64,
    /// Purchases as a percentage of revenue, 0 when there is no revenue.
    pub purchase_ratio_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum MonthStatus {
    Ok,
    Attention,
}

impl MonthStatus {
    pub fn label(&self) -> &'static str {
        match self {
            MonthStatus::Ok => "OK",
            MonthStatus::Attention => "Atenção",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonthlyRow {
    pub period: PeriodKey,
    pub purchases: f64,
    pub revenue: f64,
    pub purchase_ratio_percent: f64,
    pub status: MonthStatus,
}

pub fn purchase_ratio_percent(purchases: f64, revenue: f64) -> f64 {
    if revenue > 0.0 {
        purchases / revenue * 100.0
    } else {
        0.0
    }
}

pub fn company_totals(company: &CompanyRecord) -> CompanyTotals {
    let (purchases, revenue) = company
        .periods
        .values()
        .fold((0.0, 0.0), |(p, r), totals| (p + totals.purchases, r + totals.revenue));

    CompanyTotals {
        purchases,
        revenue,
        purchase_ratio_percent: purchase_ratio_percent(purchases, revenue),
    }
}

pub fn month_status(purchases: f64, revenue: f64, threshold: f64) -> MonthStatus {
    if purchases > threshold * revenue {
        MonthStatus::Attention
    } else {
        MonthStatus::Ok
    }
}

/// One row per period, oldest first.
pub fn monthly_rows(company: &CompanyRecord, config: &FiscalConfig) -> Vec<MonthlyRow> {
    // `periods` is keyed by PeriodKey, whose ordering is already chronological.
    company
        .periods
        .iter()
        .map(|(period, totals)| MonthlyRow {
            period: period.clone(),
            purchases: totals.purchases,
            revenue: totals.revenue,
            purchase_ratio_percent: purchase_ratio_percent(totals.purchases, totals.revenue),
            status: month_status(totals.purchases, totals.revenue, config.attention_threshold),
        })
        .collect()
}

pub fn sort_periods(periods: &mut [PeriodKey]) {
    periods.sort();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MonthTotals;

    fn company() -> CompanyRecord {
        let mut record = CompanyRecord::new("Loja");
        record
            .periods
            .insert(PeriodKey::new("Fevereiro", 2024), MonthTotals::new(90.0, 100.0));
        record
            .periods
            .insert(PeriodKey::new("Janeiro", 2024), MonthTotals::new(80.0, 100.0));
        record
            .periods
            .insert(PeriodKey::new("Dezembro", 2023), MonthTotals::new(30.0, 0.0));
        record
    }

    #[test]
    fn test_company_totals() {
        let totals = company_totals(&company());
        assert_eq!(totals.purchases, 200.0);
        assert_eq!(totals.revenue, 200.0);
        assert!((totals.purchase_ratio_percent - 100.0).abs() < 1e-9);

        let empty = company_totals(&CompanyRecord::new("Nada"));
        assert_eq!(empty.purchase_ratio_percent, 0.0);
    }

    #[test]
    fn test_monthly_rows_are_chronological_with_status() {
        let rows = monthly_rows(&company(), &FiscalConfig::default());
        let labels: Vec<String> = rows.iter().map(|r| r.period.to_string()).collect();
        assert_eq!(labels, vec!["Dezembro 2023", "Janeiro 2024", "Fevereiro 2024"]);

        // Purchases with no revenue at all.
        assert_eq!(rows[0].status, MonthStatus::Attention);
        assert_eq!(rows[0].purchase_ratio_percent, 0.0);
        // 80 is not strictly greater than 0.8 * 100.
        assert_eq!(rows[1].status, MonthStatus::Ok);
        assert_eq!(rows[2].status, MonthStatus::Attention);
        assert_eq!(rows[2].status.label(), "Atenção");
    }

    #[test]
    fn test_sort_periods_orders_by_year_then_month() {
        let mut periods = vec![
            PeriodKey::new("Janeiro", 2025),
            PeriodKey::new("Julho", 2024),
            PeriodKey::new("Foo", 2024),
            PeriodKey::new("Abril", 2024),
        ];
        sort_periods(&mut periods);

        let labels: Vec<String> = periods.iter().map(|p| p.to_string()).collect();
        assert_eq!(
            labels,
            vec!["Foo 2024", "Abril 2024", "Julho 2024", "Janeiro 2025"]
        );
    }
}
