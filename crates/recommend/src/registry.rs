//! Shared claim registry.
//!
//! One registry lives for one page view. Every recommendation section records
//! the product ids it committed to showing under its own [`SectionId`], and
//! filters new candidates against what *other* sections have claimed.

use catalog::{Product, ProductId};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Stable key of a section instance within a page
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SectionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Anything that can be arbitrated by product id
pub trait Claimable {
    fn claim_key(&self) -> &ProductId;
}

impl Claimable for Product {
    fn claim_key(&self) -> &ProductId {
        &self.id
    }
}

impl Claimable for ProductId {
    fn claim_key(&self) -> &ProductId {
        self
    }
}

/// What one section committed to showing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimEntry {
    pub product_ids: Vec<ProductId>,
    pub claimed_at: DateTime<Utc>,
}

/// Point-in-time copy of every claim, ordered by section id
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegistrySnapshot {
    pub entries: BTreeMap<SectionId, ClaimEntry>,
}

impl RegistrySnapshot {
    /// Product ids currently claimed by more than one section
    pub fn overlapping(&self) -> Vec<ProductId> {
        let mut seen: HashMap<&ProductId, usize> = HashMap::new();
        for entry in self.entries.values() {
            let unique: HashSet<&ProductId> = entry.product_ids.iter().collect();
            for id in unique {
                *seen.entry(id).or_default() += 1;
            }
        }
        let mut overlapping: Vec<ProductId> = seen
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(id, _)| id.clone())
            .collect();
        overlapping.sort();
        overlapping
    }
}

/// Cloneable handle to the claims of one page view.
///
/// Each call is atomic on its own. There is deliberately no combined
/// filter-and-register call: two sections completing at the same time may
/// both filter before either registers.
#[derive(Debug, Clone, Default)]
pub struct ClaimRegistry {
    entries: Arc<RwLock<HashMap<SectionId, ClaimEntry>>>,
}

impl ClaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the claim of `section`
    pub fn register(&self, section: &SectionId, product_ids: Vec<ProductId>) {
        debug!(section_id = %section, claimed = product_ids.len(), "registering claim");
        self.entries.write().insert(
            section.clone(),
            ClaimEntry {
                product_ids,
                claimed_at: Utc::now(),
            },
        );
    }

    /// Keep the candidates no *other* section has claimed, in their original order
    pub fn filter<T: Claimable>(&self, section: &SectionId, candidates: Vec<T>) -> Vec<T> {
        let others = self.claimed_by_others(section);
        if others.is_empty() {
            return candidates;
        }

        let before = candidates.len();
        let kept: Vec<T> = candidates
            .into_iter()
            .filter(|c| !others.contains(c.claim_key()))
            .collect();
        debug!(
            section_id = %section,
            before = before,
            after = kept.len(),
            "filtered candidates against other sections"
        );
        kept
    }

    /// Union of every claim except `section`'s own
    pub fn claimed_by_others(&self, section: &SectionId) -> HashSet<ProductId> {
        self.entries
            .read()
            .iter()
            .filter(|(id, _)| *id != section)
            .flat_map(|(_, entry)| entry.product_ids.iter().cloned())
            .collect()
    }

    pub fn globally_claimed(&self) -> HashSet<ProductId> {
        self.entries
            .read()
            .values()
            .flat_map(|entry| entry.product_ids.iter().cloned())
            .collect()
    }

    pub fn claims(&self, section: &SectionId) -> Option<Vec<ProductId>> {
        self.entries
            .read()
            .get(section)
            .map(|entry| entry.product_ids.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every claim (full page reset)
    pub fn reset(&self) {
        let mut entries = self.entries.write();
        debug!(sections = entries.len(), "resetting claim registry");
        entries.clear();
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            entries: self
                .entries
                .read()
                .iter()
                .map(|(id, entry)| (id.clone(), entry.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(raw: &[&str]) -> Vec<ProductId> {
        raw.iter().map(|s| ProductId::new(*s)).collect()
    }

    #[test]
    fn test_filter_on_empty_registry_is_identity() {
        let registry = ClaimRegistry::new();
        let candidates = ids(&["p1", "p2", "p3"]);
        assert_eq!(
            registry.filter(&SectionId::from("popular"), candidates.clone()),
            candidates
        );
    }

    #[test]
    fn test_filter_excludes_other_sections_only() {
        let registry = ClaimRegistry::new();
        registry.register(&"popular".into(), ids(&["p1", "p2", "p3", "p4"]));

        let related = registry.filter(&"related".into(), ids(&["p2", "p3", "p5", "p6"]));
        assert_eq!(related, ids(&["p5", "p6"]));

        // Своя прошлая заявка не фильтрует новые кандидаты
        let popular = registry.filter(&"popular".into(), ids(&["p1", "p2", "p7"]));
        assert_eq!(popular, ids(&["p1", "p2", "p7"]));
    }

    #[test]
    fn test_register_overwrites_and_is_idempotent() {
        let registry = ClaimRegistry::new();
        let section = SectionId::from("popular");

        registry.register(&section, ids(&["p1", "p2"]));
        registry.register(&section, ids(&["p3"]));
        registry.register(&section, ids(&["p3"]));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.claims(&section), Some(ids(&["p3"])));
        let expected: HashSet<ProductId> = ids(&["p3"]).into_iter().collect();
        assert_eq!(registry.globally_claimed(), expected);
    }

    #[test]
    fn test_reset_clears_all_claims() {
        let registry = ClaimRegistry::new();
        registry.register(&"a".into(), ids(&["p1"]));
        registry.register(&"b".into(), ids(&["p2"]));

        registry.reset();

        assert!(registry.is_empty());
        let candidates = ids(&["p1", "p2"]);
        assert_eq!(registry.filter(&"c".into(), candidates.clone()), candidates);
    }

    #[test]
    fn test_clones_share_state() {
        let registry = ClaimRegistry::new();
        let handle = registry.clone();
        handle.register(&"a".into(), ids(&["p1"]));
        assert_eq!(registry.claims(&"a".into()), Some(ids(&["p1"])));
    }

    #[test]
    fn test_interleaved_filters_can_overlap() {
        let registry = ClaimRegistry::new();
        let pool = ids(&["p1", "p2", "p3"]);

        // Обе секции читают реестр до того как любая из них записала заявку
        let a = registry.filter(&"a".into(), pool.clone());
        let b = registry.filter(&"b".into(), pool.clone());
        registry.register(&"a".into(), a);
        registry.register(&"b".into(), b);

        assert_eq!(registry.snapshot().overlapping(), pool);
    }

    #[test]
    fn test_snapshot_serializes_in_section_order() {
        let registry = ClaimRegistry::new();
        registry.register(&"related".into(), ids(&["p5"]));
        registry.register(&"popular".into(), ids(&["p1"]));

        let json = serde_json::to_value(registry.snapshot()).unwrap();
        let keys: Vec<&String> = json["entries"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["popular", "related"]);
        assert_eq!(json["entries"]["related"]["product_ids"][0], "p5");
    }

    proptest! {
        #[test]
        fn prop_sequential_claims_stay_disjoint(
            pools in proptest::collection::vec(
                proptest::collection::vec(0u8..20, 0..12),
                1..6,
            )
        ) {
            let registry = ClaimRegistry::new();
            for (i, pool) in pools.iter().enumerate() {
                let section = SectionId::new(format!("s{i}"));
                let mut candidates: Vec<ProductId> =
                    pool.iter().map(|n| ProductId::new(format!("p{n}"))).collect();
                candidates.dedup();
                let filtered = registry.filter(&section, candidates);
                if !filtered.is_empty() {
                    registry.register(&section, filtered);
                }
            }

            let snapshot = registry.snapshot();
            prop_assert!(snapshot.overlapping().is_empty());
        }
    }
}
