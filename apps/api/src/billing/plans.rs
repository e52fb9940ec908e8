use std::collections::HashMap;

use thiserror::Error;

/// Tier assigned when a subscription lapses.
pub const FREE_TIER: &str = "free";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanCatalogError {
    #[error("malformed plan entry '{0}', expected <variant_id>=<tier>")]
    Malformed(String),

    #[error("variant {0} is mapped more than once")]
    Duplicate(u64),
}

/// Maps store variant ids to plan tier labels. Loaded once at startup, read-only
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanCatalog {
    variants: HashMap<u64, String>,
}

impl PlanCatalog {
    /// Parses `"123=pro, 456=premium"`. Tier labels are lowercased.
    pub fn parse(raw: &str) -> Result<Self, PlanCatalogError> {
        let mut variants = HashMap::new();

        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (id, tier) = entry
                .split_once('=')
                .ok_or_else(|| PlanCatalogError::Malformed(entry.to_string()))?;
            let id: u64 = id
                .trim()
                .parse()
                .map_err(|_| PlanCatalogError::Malformed(entry.to_string()))?;
            let tier = tier.trim().to_lowercase();
            if tier.is_empty() {
                return Err(PlanCatalogError::Malformed(entry.to_string()));
            }
            if variants.insert(id, tier).is_some() {
                return Err(PlanCatalogError::Duplicate(id));
            }
        }

        Ok(Self { variants })
    }

    pub fn tier_for(&self, variant_id: u64) -> Option<&str> {
        self.variants.get(&variant_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}
