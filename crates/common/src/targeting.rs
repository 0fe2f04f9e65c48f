//! Page-level targeting overrides.
//!
//! Publishers can register a provider that rewrites a slot's targeting
//! key/values after the adapter assembled them. The provider is optional;
//! when it returns nothing (or an empty map) the slot keeps its own targeting.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

pub type Targeting = Map<String, Json>;

/// Source of per-slot targeting overrides.
pub trait TargetingProvider: Send + Sync {
    /// Targeting to use for `ad_unit_id`, given the slot's current targeting.
    fn targeting(&self, ad_unit_id: &str, current: Option<&Json>) -> Option<Targeting>;
}

impl<F> TargetingProvider for F
where
    F: Fn(&str, Option<&Json>) -> Option<Targeting> + Send + Sync,
{
    fn targeting(&self, ad_unit_id: &str, current: Option<&Json>) -> Option<Targeting> {
        self(ad_unit_id, current)
    }
}

/// Fixed overrides keyed by ad unit id, e.g. loaded from a JSON file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct StaticTargeting {
    pub by_ad_unit: HashMap<String, Targeting>,
}

impl TargetingProvider for StaticTargeting {
    fn targeting(&self, ad_unit_id: &str, _current: Option<&Json>) -> Option<Targeting> {
        self.by_ad_unit.get(ad_unit_id).cloned()
    }
}

/// Resolve the override for one slot. Empty mappings count as no override.
pub(crate) fn resolve_override(
    provider: &dyn TargetingProvider,
    ad_unit_id: &str,
    current: Option<&Json>,
) -> Option<Targeting> {
    provider
        .targeting(ad_unit_id, current)
        .filter(|targeting| !targeting.is_empty())
}
