use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Canonical month labels as they appear in the declarations, in calendar order.
pub const MONTHS: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

static LEADING_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
        .expect("valid leading number regex")
});

/// Converts a Brazilian formatted amount ("1.234,56") into a number.
///
/// Every dot is treated as a thousands separator and dropped, the first comma
/// becomes the decimal point. Parsing is lenient: the longest numeric prefix
/// is used and anything without one yields `0.0`.
pub fn parse_brazilian_decimal(value: &str) -> f64 {
    let normalized = value.replace('.', "").replacen(',', ".", 1);

    LEADING_NUMBER_RE
        .find(&normalized)
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Returns the 0-based position of a canonical month label, or -1 when the
/// label is not one of the twelve known months.
pub fn month_index(month: &str) -> i32 {
    MONTHS
        .iter()
        .position(|m| *m == month)
        .map(|idx| idx as i32)
        .unwrap_or(-1)
}

/// Upper-cases the first character and lower-cases the rest ("MARÇO" -> "Março").
pub fn title_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.checked_sub_days(Days::new(1))
}

/// Formats an amount as Brazilian reais, e.g. `R$ 1.234,56`.
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (idx, digit) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}R$ {},{}", sign, grouped, fraction)
}

pub fn format_percentage(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Masks an 11-digit individual tax id as `ddd.ddd.ddd-dd`.
/// Anything else is returned untouched.
pub fn format_cpf(cpf: &str) -> String {
    if cpf.len() == 11 && cpf.chars().all(|c| c.is_ascii_digit()) {
        format!(
            "{}.{}.{}-{}",
            &cpf[0..3],
            &cpf[3..6],
            &cpf[6..9],
            &cpf[9..11]
        )
    } else {
        cpf.to_string()
    }
}

/// Replaces everything outside `[a-zA-Z0-9]` with `_` so the value can be used in a file name.
pub fn sanitize_file_component(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_brazilian_decimal() {
        assert_eq!(parse_brazilian_decimal("1.234,56"), 1234.56);
        assert_eq!(parse_brazilian_decimal("0,00"), 0.0);
        assert_eq!(parse_brazilian_decimal("500,00"), 500.0);
        assert_eq!(parse_brazilian_decimal("1.234.567,89"), 1_234_567.89);
        assert_eq!(parse_brazilian_decimal("42"), 42.0);
    }

    #[test]
    fn test_parse_brazilian_decimal_is_lenient() {
        assert_eq!(parse_brazilian_decimal(""), 0.0);
        assert_eq!(parse_brazilian_decimal("abc"), 0.0);
        assert_eq!(parse_brazilian_decimal(",,,"), 0.0);
        assert_eq!(parse_brazilian_decimal("..."), 0.0);
        // Only the first comma becomes a decimal point; the prefix before the second one wins.
        assert_eq!(parse_brazilian_decimal("1,2,3"), 1.2);
        assert_eq!(parse_brazilian_decimal("12,5 R$"), 12.5);
    }

    #[test]
    fn test_month_index() {
        assert_eq!(month_index("Janeiro"), 0);
        assert_eq!(month_index("Março"), 2);
        assert_eq!(month_index("Dezembro"), 11);
        assert_eq!(month_index("January"), -1);
        assert_eq!(month_index("janeiro"), -1);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("JANEIRO"), "Janeiro");
        assert_eq!(title_case("MARÇO"), "Março");
        assert_eq!(title_case("fevereiro"), "Fevereiro");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(
            last_day_of_month(2024, 2),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            last_day_of_month(2023, 12),
            NaiveDate::from_ymd_opt(2023, 12, 31)
        );
        assert_eq!(last_day_of_month(2023, 13), None);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234.56), "R$ 1.234,56");
        assert_eq!(format_currency(0.0), "R$ 0,00");
        assert_eq!(format_currency(999.999), "R$ 1.000,00");
        assert_eq!(format_currency(1_234_567.8), "R$ 1.234.567,80");
        assert_eq!(format_currency(-1.0), "-R$ 1,00");
    }

    #[test]
    fn test_format_percentage_and_cpf() {
        assert_eq!(format_percentage(12.345), "12.3%");
        assert_eq!(format_percentage(0.0), "0.0%");
        assert_eq!(format_cpf("12345678901"), "123.456.789-01");
        assert_eq!(format_cpf("123"), "123");
    }

    #[test]
    fn test_sanitize_file_component() {
        assert_eq!(sanitize_file_component("Padaria São João Ltda."), "Padaria_S_o_Jo_o_Ltda_");
    }
}
