use crate::error::{FiscalError, Result};
use crate::utils::{last_day_of_month, month_index, MONTHS};
use chrono::{Datelike, NaiveDate};
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Reporting period of a declaration block, rendered as `"<Month> <Year>"`.
///
/// Ordering is chronological: numeric year first, then the position of the
/// month among the twelve canonical labels. A label outside that list has
/// index -1 and therefore sorts before `Janeiro` of the same year.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeriodKey {
    pub month: String,
    pub year: u16,
}

impl PeriodKey {
    pub fn new(month: impl Into<String>, year: u16) -> Self {
        Self {
            month: month.into(),
            year,
        }
    }

    /// Builds the key for the calendar month containing `date`.
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        let year = u16::try_from(date.year()).ok()?;
        let month = MONTHS.get(date.month0() as usize)?;
        Some(Self::new(*month, year))
    }

    pub fn month_index(&self) -> i32 {
        month_index(&self.month)
    }

    /// Last calendar day of the period, `None` for unrecognized month labels.
    pub fn month_end(&self) -> Option<NaiveDate> {
        let idx = self.month_index();
        if idx < 0 {
            return None;
        }
        last_day_of_month(i32::from(self.year), idx as u32 + 1)
    }
}

impl Ord for PeriodKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.year
            .cmp(&other.year)
            .then_with(|| self.month_index().cmp(&other.month_index()))
            .then_with(|| self.month.cmp(&other.month))
    }
}

impl PartialOrd for PeriodKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:04}", self.month, self.year)
    }
}

impl FromStr for PeriodKey {
    type Err = FiscalError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || FiscalError::InvalidPeriod(s.to_string());

        let (month, year) = s.trim().rsplit_once(' ').ok_or_else(invalid)?;
        let month = month.trim();
        if month.is_empty() || year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let year = year.parse::<u16>().map_err(|_| invalid())?;
        Ok(Self::new(month, year))
    }
}

impl Serialize for PeriodKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PeriodKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for PeriodKey {
    fn schema_name() -> String {
        "PeriodKey".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonthTotals {
    #[schemars(description = "Sum of inbound amounts with a purchase CFOP")]
    pub purchases: f64,

    #[schemars(description = "Sum of outbound amounts with a revenue CFOP")]
    pub revenue: f64,
}

impl MonthTotals {
    pub fn new(purchases: f64, revenue: f64) -> Self {
        Self { purchases, revenue }
    }

    pub fn add(&mut self, other: &MonthTotals) {
        self.purchases += other.purchases;
        self.revenue += other.revenue;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CompanyRecord {
    #[schemars(description = "Company name as last read from a declaration")]
    pub name: String,

    #[schemars(description = "Monthly totals keyed by '<Month> <Year>'")]
    pub periods: BTreeMap<PeriodKey, MonthTotals>,
}

impl CompanyRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            periods: BTreeMap::new(),
        }
    }
}

/// Parse output and long-lived dataset alike: company tax id -> record.
pub type ParsedDataset = BTreeMap<String, CompanyRecord>;

pub fn dataset_json_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(ParsedDataset)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Partner {
    pub name: String,

    #[schemars(description = "Individual tax id (CPF), digits only")]
    pub tax_id: String,

    #[schemars(description = "Ownership share in percent, 0 to 100")]
    pub share_percent: f64,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FiscalConfig {
    #[schemars(description = "Literal text that opens every declaration block")]
    pub block_marker: String,

    #[schemars(description = "CFOP codes counted as purchases when found under ENTRADAS")]
    pub purchase_codes: Vec<String>,

    #[schemars(description = "CFOP codes counted as revenue when found under SAÍDAS")]
    pub revenue_codes: Vec<String>,

    #[schemars(
        description = "A month is flagged for attention when purchases exceed this fraction of revenue"
    )]
    pub attention_threshold: f64,

    #[schemars(
        description = "Minimum ownership share (percent) for a partner to appear in the global revenue view"
    )]
    pub partner_min_share: f64,
}

impl Default for FiscalConfig {
    fn default() -> Self {
        Self {
            block_marker: "Mês ou período/ano:".to_string(),
            purchase_codes: ["1.102", "1.403", "1.404", "2.102", "2.403", "2.404"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            revenue_codes: ["5.102", "5.405"].iter().map(|c| c.to_string()).collect(),
            attention_threshold: 0.8,
            partner_min_share: 10.0,
        }
    }
}

impl FiscalConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn is_purchase_code(&self, code: &str) -> bool {
        self.purchase_codes.iter().any(|c| c == code)
    }

    pub fn is_revenue_code(&self, code: &str) -> bool {
        self.revenue_codes.iter().any(|c| c == code)
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_marker.trim().is_empty() {
            return Err(FiscalError::InvalidConfig(
                "block_marker must not be empty".to_string(),
            ));
        }

        for (label, codes) in [
            ("purchase_codes", &self.purchase_codes),
            ("revenue_codes", &self.revenue_codes),
        ] {
            if codes.is_empty() {
                return Err(FiscalError::InvalidConfig(format!(
                    "{} must not be empty",
                    label
                )));
            }
            if let Some(bad) = codes.iter().find(|c| !is_cfop_shape(c)) {
                return Err(FiscalError::InvalidConfig(format!(
                    "{} contains '{}', expected a code like 1.102",
                    label, bad
                )));
            }
        }

        if let Some(shared) = self
            .purchase_codes
            .iter()
            .find(|c| self.revenue_codes.contains(c))
        {
            return Err(FiscalError::InvalidConfig(format!(
                "code {} is listed as both purchase and revenue",
                shared
            )));
        }

        if !self.attention_threshold.is_finite() || self.attention_threshold < 0.0 {
            return Err(FiscalError::InvalidConfig(format!(
                "attention_threshold {} must be a non-negative number",
                self.attention_threshold
            )));
        }

        if !(0.0..=100.0).contains(&self.partner_min_share) {
            return Err(FiscalError::InvalidConfig(format!(
                "partner_min_share {} must be between 0 and 100",
                self.partner_min_share
            )));
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(FiscalConfig)
    }
}

fn is_cfop_shape(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() == 5
        && bytes[0].is_ascii_digit()
        && bytes[1] == b'.'
        && bytes[2..].iter().all(u8::is_ascii_digit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_key_display_and_parse() {
        let key: PeriodKey = "Janeiro 2024".parse().unwrap();
        assert_eq!(key, PeriodKey::new("Janeiro", 2024));
        assert_eq!(key.to_string(), "Janeiro 2024");

        assert!("Janeiro".parse::<PeriodKey>().is_err());
        assert!("Janeiro 24".parse::<PeriodKey>().is_err());
        assert!(" 2024".parse::<PeriodKey>().is_err());
    }

    #[test]
    fn test_period_key_chronological_order() {
        let mut keys = vec![
            PeriodKey::new("Março", 2024),
            PeriodKey::new("Dezembro", 2023),
            PeriodKey::new("Janeiro", 2024),
            PeriodKey::new("Fevereiro", 2024),
        ];
        keys.sort();

        let labels: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(
            labels,
            vec!["Dezembro 2023", "Janeiro 2024", "Fevereiro 2024", "Março 2024"]
        );
    }

    #[test]
    fn test_unrecognized_month_sorts_before_january() {
        // Unknown labels take index -1; this mirrors the dashboard's comparator and is
        // kept on purpose rather than treated as a validation error.
        let unknown = PeriodKey::new("Marco", 2024);
        assert_eq!(unknown.month_index(), -1);
        assert!(unknown < PeriodKey::new("Janeiro", 2024));
        assert!(unknown > PeriodKey::new("Dezembro", 2023));
        assert_eq!(unknown.month_end(), None);
    }

    #[test]
    fn test_period_key_dates() {
        let key = PeriodKey::new("Fevereiro", 2024);
        assert_eq!(key.month_end(), NaiveDate::from_ymd_opt(2024, 2, 29));

        let date = NaiveDate::from_ymd_opt(2023, 3, 15).unwrap();
        assert_eq!(PeriodKey::from_date(date), Some(PeriodKey::new("Março", 2023)));
    }

    #[test]
    fn test_dataset_serialization_uses_period_labels() {
        let mut record = CompanyRecord::new("Acme Comércio");
        record
            .periods
            .insert(PeriodKey::new("Janeiro", 2024), MonthTotals::new(100.0, 200.0));

        let mut dataset = ParsedDataset::new();
        dataset.insert("11222333000144".to_string(), record);

        let json = serde_json::to_string(&dataset).unwrap();
        assert!(json.contains("\"Janeiro 2024\""));
        assert!(json.contains("\"purchases\":100.0"));

        let back: ParsedDataset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dataset);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = FiscalConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.is_purchase_code("1.102"));
        assert!(config.is_revenue_code("5.405"));
        assert!(!config.is_revenue_code("1.102"));
    }

    #[test]
    fn test_config_rejects_overlapping_codes() {
        let mut config = FiscalConfig::default();
        config.revenue_codes.push("1.102".to_string());
        assert!(matches!(
            config.validate(),
            Err(FiscalError::InvalidConfig(_))
        ));

        let mut config = FiscalConfig::default();
        config.purchase_codes = vec!["1102".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_partial_json() {
        let config = FiscalConfig::from_json(r#"{"attention_threshold": 0.5}"#).unwrap();
        assert_eq!(config.attention_threshold, 0.5);
        assert_eq!(config.revenue_codes, vec!["5.102", "5.405"]);

        assert!(FiscalConfig::from_json(r#"{"partner_min_share": 150.0}"#).is_err());
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = serde_json::to_string_pretty(&dataset_json_schema()).unwrap();
        assert!(schema_json.contains("purchases"));
        assert!(schema_json.contains("revenue"));

        let config_schema =
            serde_json::to_string_pretty(&FiscalConfig::generate_json_schema()).unwrap();
        assert!(config_schema.contains("block_marker"));
    }
}
