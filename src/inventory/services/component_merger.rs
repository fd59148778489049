use crate::inventory::domain::{Component, ComponentKey};
use crate::inventory::policies::ScopePrecedence;
use std::collections::HashMap;

/// ComponentMerger service for deduplicating scanner output
///
/// Concatenated scanner results may report the same dependency several
/// times (root manifest plus nested module manifests, or two ecosystems
/// sharing a package). The merger keeps the first occurrence of each
/// `(name, version, group)` identity, preserving discovery order, and
/// upgrades its scope when a later duplicate carries a stronger one.
///
/// Merging is idempotent: running it over an already-merged sequence
/// returns the sequence unchanged.
pub struct ComponentMerger;

impl ComponentMerger {
    pub fn merge(components: Vec<Component>) -> Vec<Component> {
        let mut merged: Vec<Component> = Vec::with_capacity(components.len());
        let mut positions: HashMap<ComponentKey, usize> = HashMap::new();

        for component in components {
            match positions.get(&component.key()) {
                Some(&position) => {
                    let winner =
                        ScopePrecedence::stronger(merged[position].scope(), component.scope());
                    if winner != merged[position].scope() {
                        merged[position].reclassify(winner);
                    }
                }
                None => {
                    positions.insert(component.key(), merged.len());
                    merged.push(component);
                }
            }
        }

        merged
    }
}
