use crate::error::{FiscalError, Result};
use crate::ingestion::parse_files;
use crate::schema::{CompanyRecord, FiscalConfig, ParsedDataset};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::path::Path;

/// Folds `incoming` into `target`.
///
/// Periods present on both sides are summed field by field, anything new is copied
/// in. The incoming name replaces the stored one. The merge is always additive:
/// folding the same data twice doubles it.
pub fn merge_into(target: &mut ParsedDataset, incoming: ParsedDataset) {
    for (company_id, record) in incoming {
        match target.entry(company_id) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                existing.name = record.name;
                for (period, totals) in record.periods {
                    existing.periods.entry(period).or_default().add(&totals);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Companies found in the imported batch.
    pub companies_in_batch: usize,
    /// Companies that were not in the ledger before this import.
    pub new_companies: usize,
    pub selected: Option<String>,
}

/// The caller's long-lived dataset, consolidated across imports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    dataset: ParsedDataset,
    selected: Option<String>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dataset(dataset: ParsedDataset) -> Self {
        let selected = dataset.keys().next().cloned();
        Self { dataset, selected }
    }

    /// Merges a parse result. An empty result is rejected with
    /// [`FiscalError::NoValidData`] and leaves the ledger untouched.
    pub fn import(&mut self, parsed: ParsedDataset) -> Result<ImportSummary> {
        self.import_batch(parsed, None)
    }

    pub fn import_files<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        config: &FiscalConfig,
    ) -> Result<ImportSummary> {
        let parsed = parse_files(paths, config)?;
        self.import_batch(parsed, Some(paths.len()))
    }

    fn import_batch(
        &mut self,
        parsed: ParsedDataset,
        files: Option<usize>,
    ) -> Result<ImportSummary> {
        if parsed.is_empty() {
            return Err(FiscalError::NoValidData { files });
        }

        let companies_in_batch = parsed.len();
        let new_companies = parsed
            .keys()
            .filter(|id| !self.dataset.contains_key(*id))
            .count();

        merge_into(&mut self.dataset, parsed);

        if self.selected.is_none() {
            self.selected = self.dataset.keys().next().cloned();
        }

        info!(
            "Imported {} compan(ies), {} new; ledger now holds {}",
            companies_in_batch,
            new_companies,
            self.dataset.len()
        );

        Ok(ImportSummary {
            companies_in_batch,
            new_companies,
            selected: self.selected.clone(),
        })
    }

    pub fn dataset(&self) -> &ParsedDataset {
        &self.dataset
    }

    pub fn into_dataset(self) -> ParsedDataset {
        self.dataset
    }

    pub fn company(&self, company_id: &str) -> Option<&CompanyRecord> {
        self.dataset.get(company_id)
    }

    pub fn selected(&self) -> Option<(&str, &CompanyRecord)> {
        let id = self.selected.as_deref()?;
        self.dataset.get(id).map(|record| (id, record))
    }

    pub fn select(&mut self, company_id: &str) -> Result<()> {
        if !self.dataset.contains_key(company_id) {
            return Err(FiscalError::UnknownCompany(company_id.to_string()));
        }
        self.selected = Some(company_id.to_string());
        Ok(())
    }

    pub fn remove_company(&mut self, company_id: &str) -> Result<CompanyRecord> {
        let record = self
            .dataset
            .remove(company_id)
            .ok_or_else(|| FiscalError::UnknownCompany(company_id.to_string()))?;

        if self.selected.as_deref() == Some(company_id) {
            self.selected = self.dataset.keys().next().cloned();
        }
        debug!("Removed company {}", company_id);

        Ok(record)
    }
}
