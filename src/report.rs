use crate::calculations::{company_totals, monthly_rows, CompanyTotals, MonthlyRow};
use crate::partners::{partner_revenue, PartnerRevenue};
use crate::schema::{CompanyRecord, FiscalConfig, ParsedDataset, Partner};
use crate::utils::{format_currency, format_percentage, sanitize_file_component};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const MAX_SHEET_NAME_CHARS: usize = 31;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyReport {
    pub company_id: String,
    pub company_name: String,
    pub report_date: NaiveDate,
    pub monthly: Vec<MonthlyRow>,
    pub totals: CompanyTotals,
    pub partners: Vec<PartnerRevenue>,
}

impl CompanyReport {
    pub fn build(
        company_id: &str,
        company: &CompanyRecord,
        partners: &[Partner],
        config: &FiscalConfig,
        report_date: NaiveDate,
    ) -> Self {
        Self {
            company_id: company_id.to_string(),
            company_name: company.name.clone(),
            report_date,
            monthly: monthly_rows(company, config),
            totals: company_totals(company),
            partners: partner_revenue(company, partners),
        }
    }

    pub fn file_stem(&self) -> String {
        report_file_stem(&self.company_name, self.report_date)
    }

    /// Label/value pairs of the summary section.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("CNPJ", self.company_id.clone()),
            ("Empresa", self.company_name.clone()),
            ("Faturamento Total", format_currency(self.totals.revenue)),
            ("Compras Total", format_currency(self.totals.purchases)),
            (
                "Percentual C/V",
                format_percentage(self.totals.purchase_ratio_percent),
            ),
            ("Número de Sócios", self.partners.len().to_string()),
            (
                "Data do Relatório",
                self.report_date.format("%d/%m/%Y").to_string(),
            ),
        ]
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str("Mês/Ano,Faturamento,Compras,Percentual C/V,Status\n");
        push_monthly_csv(&mut output, &self.monthly);
        output.push_str(&format!(
            "TOTAL,{},{},{},\n",
            csv_field(&format_currency(self.totals.revenue)),
            csv_field(&format_currency(self.totals.purchases)),
            format_percentage(self.totals.purchase_ratio_percent)
        ));

        if !self.partners.is_empty() {
            output.push('\n');
            output.push_str(
                "Nome do Sócio,Participação (%),Faturamento Total,Faturamento por Sócio\n",
            );
            for partner in &self.partners {
                output.push_str(&format!(
                    "{},{:.2}%,{},{}\n",
                    csv_field(&partner.name),
                    partner.share_percent,
                    csv_field(&format_currency(partner.company_revenue)),
                    csv_field(&format_currency(partner.partner_revenue))
                ));
            }
        }

        output.push('\n');
        output.push_str("Campo,Valor\n");
        for (label, value) in self.summary() {
            output.push_str(&format!("{},{}\n", label, csv_field(&value)));
        }

        output
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "# Relatório - {} ({})\n\n",
            self.company_name, self.company_id
        ));

        output.push_str("## Dados Fiscais\n\n");
        push_monthly_markdown(&mut output, &self.monthly);
        output.push_str(&format!(
            "| **TOTAL** | {} | {} | {} | |\n\n",
            format_currency(self.totals.revenue),
            format_currency(self.totals.purchases),
            format_percentage(self.totals.purchase_ratio_percent)
        ));

        if !self.partners.is_empty() {
            output.push_str("## Faturamento por Sócio\n\n");
            output.push_str(
                "| Nome do Sócio | Participação (%) | Faturamento Total | Faturamento por Sócio |\n",
            );
            output.push_str("|---|---|---|---|\n");
            for partner in &self.partners {
                output.push_str(&format!(
                    "| {} | {:.2}% | {} | {} |\n",
                    partner.name,
                    partner.share_percent,
                    format_currency(partner.company_revenue),
                    format_currency(partner.partner_revenue)
                ));
            }
            output.push('\n');
        }

        output.push_str("## Resumo\n\n");
        for (label, value) in self.summary() {
            output.push_str(&format!("- **{}:** {}\n", label, value));
        }

        output
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedRow {
    pub company_id: String,
    pub company_name: String,
    pub totals: CompanyTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanySheet {
    /// Company name cut to the 31 characters a spreadsheet tab allows.
    pub sheet_name: String,
    pub monthly: Vec<MonthlyRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedReport {
    pub companies: Vec<ConsolidatedRow>,
    pub details: Vec<CompanySheet>,
}

impl ConsolidatedReport {
    pub fn build(dataset: &ParsedDataset, config: &FiscalConfig) -> Self {
        let mut companies = Vec::with_capacity(dataset.len());
        let mut details = Vec::with_capacity(dataset.len());

        for (company_id, company) in dataset {
            companies.push(ConsolidatedRow {
                company_id: company_id.clone(),
                company_name: company.name.clone(),
                totals: company_totals(company),
            });
            details.push(CompanySheet {
                sheet_name: company.name.chars().take(MAX_SHEET_NAME_CHARS).collect(),
                monthly: monthly_rows(company, config),
            });
        }

        Self { companies, details }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str("CNPJ,Empresa,Faturamento Total,Compras Total,Percentual C/V\n");

        for row in &self.companies {
            output.push_str(&format!(
                "{},{},{},{},{}\n",
                csv_field(&row.company_id),
                csv_field(&row.company_name),
                csv_field(&format_currency(row.totals.revenue)),
                csv_field(&format_currency(row.totals.purchases)),
                format_percentage(row.totals.purchase_ratio_percent)
            ));
        }

        for sheet in &self.details {
            output.push('\n');
            output.push_str(&format!("{}\n", csv_field(&sheet.sheet_name)));
            output.push_str("Mês/Ano,Faturamento,Compras,Percentual C/V,Status\n");
            push_monthly_csv(&mut output, &sheet.monthly);
        }

        output
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("# Relatório Consolidado\n\n");
        output.push_str("| CNPJ | Empresa | Faturamento Total | Compras Total | Percentual C/V |\n");
        output.push_str("|---|---|---|---|---|\n");
        for row in &self.companies {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                row.company_id,
                row.company_name,
                format_currency(row.totals.revenue),
                format_currency(row.totals.purchases),
                format_percentage(row.totals.purchase_ratio_percent)
            ));
        }
        output.push('\n');

        for sheet in &self.details {
            output.push_str(&format!("## {}\n\n", sheet.sheet_name));
            push_monthly_markdown(&mut output, &sheet.monthly);
            output.push('\n');
        }

        output
    }
}

/// `relatorio_<sanitized name>_<yyyy-mm-dd>`
pub fn report_file_stem(company_name: &str, date: NaiveDate) -> String {
    format!(
        "relatorio_{}_{}",
        sanitize_file_component(company_name),
        date.format("%Y-%m-%d")
    )
}

fn push_monthly_csv(output: &mut String, rows: &[MonthlyRow]) {
    for row in rows {
        output.push_str(&format!(
            "{},{},{},{},{}\n",
            row.period,
            csv_field(&format_currency(row.revenue)),
            csv_field(&format_currency(row.purchases)),
            format_percentage(row.purchase_ratio_percent),
            row.status.label()
        ));
    }
}

fn push_monthly_markdown(output: &mut String, rows: &[MonthlyRow]) {
    output.push_str("| Mês/Ano | Faturamento | Compras | Percentual C/V | Status |\n");
    output.push_str("|---|---|---|---|---|\n");
    for row in rows {
        output.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            row.period,
            format_currency(row.revenue),
            format_currency(row.purchases),
            format_percentage(row.purchase_ratio_percent),
            row.status.label()
        ));
    }
}

// Currency values carry a decimal comma, so quote anything that would break the row.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
