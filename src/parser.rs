//! Text scanner for fiscal declaration files.
//!
//! A file is cut into blocks at every occurrence of the block marker. Each block
//! describes one company and one reporting period; its CFOP lines are summed into
//! purchases (inbound section) or revenue (outbound section). Anything that does not
//! fit the expected layout is skipped, never reported as an error.

use crate::schema::{FiscalConfig, MonthTotals, ParsedDataset, PeriodKey};
use crate::utils::{parse_brazilian_decimal, title_case};
use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;

static CNPJ_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"CNPJ[:\s]+([0-9./-]+)").expect("valid cnpj regex"));

static COMPANY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Empresa[:\s]+([^\r\n]+)").expect("valid company regex"));

static PERIOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-zçÇ]+)\s*/\s*([0-9]{4})").expect("valid period regex")
});

static CFOP_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([0-9]\.[0-9]{3})\s+([0-9.,]+)").expect("valid cfop line regex")
});

const INBOUND_MARKER: &str = "ENTRADAS";
const OUTBOUND_MARKER: &str = "SAÍDAS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    None,
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFields {
    pub company_id: String,
    pub company_name: String,
    pub period: PeriodKey,
}

/// Splits `text` immediately before every occurrence of `marker`.
///
/// Text preceding the first marker forms its own block. Blocks made only of
/// whitespace are dropped.
pub fn split_blocks<'a>(text: &'a str, marker: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    let mut rest = text;

    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }

        // A marker at the very start of `rest` opens the current block, so search past it.
        let skip = rest.chars().next().map_or(0, char::len_utf8);
        let end = if marker.is_empty() {
            None
        } else {
            rest[skip..].find(marker).map(|idx| idx + skip)
        };

        let (block, tail) = rest.split_at(end.unwrap_or(rest.len()));
        rest = tail;
        Some(block)
    })
    .filter(|block| !block.trim().is_empty())
}

/// Pulls company id, company name and period out of a block.
/// Returns `None` as soon as one of the three is missing.
pub fn extract_fields(block: &str) -> Option<BlockFields> {
    let company_id = CNPJ_RE.captures(block)?.get(1)?.as_str().trim().to_string();
    let company_name = COMPANY_RE
        .captures(block)?
        .get(1)?
        .as_str()
        .trim()
        .to_string();

    let period_caps = PERIOD_RE.captures(block)?;
    let month = title_case(period_caps.get(1)?.as_str().trim());
    let year = period_caps.get(2)?.as_str().parse::<u16>().ok()?;

    Some(BlockFields {
        company_id,
        company_name,
        period: PeriodKey::new(month, year),
    })
}

/// Walks the block line by line and adds every recognized CFOP amount to `totals`.
pub fn classify_lines(block: &str, config: &FiscalConfig, totals: &mut MonthTotals) {
    let mut section = Section::None;

    for line in block.split('\n') {
        let line = line.trim();

        if line.contains(INBOUND_MARKER) {
            section = Section::Inbound;
            continue;
        }
        if line.contains(OUTBOUND_MARKER) {
            section = Section::Outbound;
            continue;
        }

        let Some(caps) = CFOP_LINE_RE.captures(line) else {
            continue;
        };
        let code = &caps[1];
        let amount = parse_brazilian_decimal(&caps[2]);

        match section {
            Section::Inbound if config.is_purchase_code(code) => {
                trace!("purchase {} += {}", code, amount);
                totals.purchases += amount;
            }
            Section::Outbound if config.is_revenue_code(code) => {
                trace!("revenue {} += {}", code, amount);
                totals.revenue += amount;
            }
            _ => trace!("ignored code {} in section {:?}", code, section),
        }
    }
}

/// Runs the whole pipeline over the decoded text of one file.
pub fn parse_text(text: &str, config: &FiscalConfig) -> ParsedDataset {
    let mut dataset = ParsedDataset::new();

    for block in split_blocks(text, &config.block_marker) {
        let Some(fields) = extract_fields(block) else {
            debug!("Skipping block without company id, name or period");
            continue;
        };

        let company = dataset.entry(fields.company_id.clone()).or_default();
        company.name = fields.company_name;

        let totals = company.periods.entry(fields.period.clone()).or_default();
        classify_lines(block, config, totals);

        debug!(
            "Block {} / {}: purchases {:.2}, revenue {:.2}",
            fields.company_id, fields.period, totals.purchases, totals.revenue
        );
    }

    dataset
}
