use crate::calculations::company_totals;
use crate::error::{FiscalError, Result};
use crate::schema::{CompanyRecord, Partner};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const SHARE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PartnerRevenue {
    pub name: String,
    pub share_percent: f64,
    pub company_revenue: f64,
    /// Company revenue weighted by the partner's share.
    pub partner_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PartnerHolding {
    pub company_name: String,
    pub share_percent: f64,
    pub company_revenue: f64,
}

/// Revenue of every company an individual holds a relevant share in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GlobalPartnerRevenue {
    pub tax_id: String,
    pub name: String,
    pub total_revenue: f64,
    pub companies: Vec<PartnerHolding>,
}

pub fn validate_partners(partners: &[Partner]) -> Result<()> {
    for partner in partners {
        if !(0.0..=100.0).contains(&partner.share_percent) {
            return Err(FiscalError::InvalidShare {
                partner: partner.name.clone(),
                share: partner.share_percent,
            });
        }
    }

    let total: f64 = partners
        .iter()
        .filter(|p| p.active)
        .map(|p| p.share_percent)
        .sum();
    if total > 100.0 + SHARE_TOLERANCE {
        return Err(FiscalError::OwnershipExceeded { total });
    }

    Ok(())
}

pub fn partner_revenue(company: &CompanyRecord, partners: &[Partner]) -> Vec<PartnerRevenue> {
    let company_revenue = company_totals(company).revenue;

    partners
        .iter()
        .map(|partner| PartnerRevenue {
            name: partner.name.clone(),
            share_percent: partner.share_percent,
            company_revenue,
            partner_revenue: company_revenue * partner.share_percent / 100.0,
        })
        .collect()
}

/// Groups active partners holding at least `min_share` percent by tax id.
///
/// `total_revenue` is the sum of the full revenue of each company held, not the
/// share-weighted amount.
pub fn global_revenue(
    holdings: &[(&CompanyRecord, &[Partner])],
    min_share: f64,
) -> Vec<GlobalPartnerRevenue> {
    let mut by_tax_id: BTreeMap<String, GlobalPartnerRevenue> = BTreeMap::new();

    for (company, partners) in holdings {
        let company_revenue = company_totals(company).revenue;

        for partner in partners.iter().filter(|p| p.active && p.share_percent >= min_share) {
            let entry = by_tax_id
                .entry(partner.tax_id.clone())
                .or_insert_with(|| GlobalPartnerRevenue {
                    tax_id: partner.tax_id.clone(),
                    name: partner.name.clone(),
                    total_revenue: 0.0,
                    companies: Vec::new(),
                });

            entry.total_revenue += company_revenue;
            entry.companies.push(PartnerHolding {
                company_name: company.name.clone(),
                share_percent: partner.share_percent,
                company_revenue,
            });
        }
    }

    by_tax_id.into_values().collect()
}
