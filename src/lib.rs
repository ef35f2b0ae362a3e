//! # Fiscal Ledger
//!
//! A library for reading Brazilian fiscal declaration text files and turning them
//! into per-company, per-month purchase and revenue totals.
//!
//! ## Core Concepts
//!
//! - **Block**: the text between two `Mês ou período/ano:` markers, describing one
//!   company (by CNPJ) and one reporting period
//! - **CFOP**: the tax-operation code leading each line item; a fixed table decides
//!   whether an amount counts as a purchase (under `ENTRADAS`) or revenue (under `SAÍDAS`)
//! - **Lenient parsing**: blocks, lines and amounts that do not fit the layout are
//!   skipped; only unreadable files fail a batch
//! - **Additive merge**: every batch is summed into the existing dataset, period by period
//!
//! ## Example
//!
//! ```rust,ignore
//! use fiscal_ledger::*;
//!
//! let parser = FiscalParser::new(FiscalConfig::default())?;
//! let dataset = parser.parse_files(&["janeiro.txt", "fevereiro.txt"])?;
//!
//! let mut ledger = Ledger::new();
//! ledger.import(dataset)?;
//!
//! for (cnpj, company) in ledger.dataset() {
//!     let totals = company_totals(company);
//!     println!("{} {}: {:.2} / {:.2}", cnpj, company.name, totals.purchases, totals.revenue);
//! }
//! ```

pub mod aggregator;
pub mod calculations;
pub mod error;
pub mod ingestion;
pub mod parser;
pub mod partners;
pub mod report;
pub mod schema;
pub mod utils;

pub use aggregator::{merge_into, ImportSummary, Ledger};
pub use calculations::{
    company_totals, monthly_rows, sort_periods, CompanyTotals, MonthStatus, MonthlyRow,
};
pub use error::{FiscalError, Result};
pub use ingestion::{decode_latin1, parse_files, parse_uploads, UploadedFile};
pub use parser::{classify_lines, extract_fields, parse_text, split_blocks, BlockFields, Section};
pub use partners::{
    global_revenue, partner_revenue, validate_partners, GlobalPartnerRevenue, PartnerHolding,
    PartnerRevenue,
};
pub use report::{report_file_stem, CompanyReport, ConsolidatedReport};
pub use schema::*;
pub use utils::{format_cpf, format_currency, format_percentage, parse_brazilian_decimal};

use log::{debug, info};
use std::path::Path;

/// Validated configuration bundled with the parsing entry points.
#[derive(Debug, Clone, Default)]
pub struct FiscalParser {
    config: FiscalConfig,
}

impl FiscalParser {
    pub fn new(config: FiscalConfig) -> Result<Self> {
        config.validate()?;

        debug!(
            "Parser configured with {} purchase and {} revenue codes",
            config.purchase_codes.len(),
            config.revenue_codes.len()
        );

        Ok(Self { config })
    }

    pub fn config(&self) -> &FiscalConfig {
        &self.config
    }

    pub fn parse_text(&self, text: &str) -> ParsedDataset {
        parser::parse_text(text, &self.config)
    }

    pub fn parse_uploads(&self, files: &[UploadedFile]) -> ParsedDataset {
        ingestion::parse_uploads(files, &self.config)
    }

    pub fn parse_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<ParsedDataset> {
        ingestion::parse_files(paths, &self.config)
    }

    /// Parses the batch and folds it into `ledger`.
    pub fn import_files<P: AsRef<Path>>(
        &self,
        ledger: &mut Ledger,
        paths: &[P],
    ) -> Result<ImportSummary> {
        let summary = ledger.import_files(paths, &self.config)?;
        info!(
            "{} compan(ies) found in {} file(s)",
            summary.companies_in_batch,
            paths.len()
        );
        Ok(summary)
    }
}
