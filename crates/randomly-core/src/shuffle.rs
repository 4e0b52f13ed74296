//! Deterministic collection shuffling.
//!
//! Grouping is positional: a contiguous run of items sharing a module (or
//! class) identity forms one group, and the same identity reappearing later
//! in the input forms a second, separate group. Observable ordering depends
//! on this, so it is a contract, not an implementation accident.

use crate::errors::GroupError;
use crate::keying::{key, seed_string};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Sentinel identity for items with no module or no class. A valid group of
/// its own, keyed like any named group.
pub const NO_GROUP: &str = "None";

/// What the shuffler needs to know about a collected test.
pub trait CollectedItem {
    /// Stable, run-unique identifier. Key material; never mutated.
    fn node_id(&self) -> &str;

    /// Module identity, if any. `Err` means the collaborator providing the
    /// identity failed (e.g. an import error at collection time); the
    /// shuffler maps that to "no module" rather than dropping the item.
    fn module_id(&self) -> Result<Option<&str>, GroupError>;

    /// Class identity, if any. Expected to be the fully qualified name so
    /// that identically named classes in different modules key apart.
    fn class_id(&self) -> Option<&str>;
}

/// Plain collected-test record, the shape the CLI manifest deserializes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestItem {
    pub id: String,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
}

impl TestItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            module: None,
            class: None,
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }
}

impl CollectedItem for TestItem {
    fn node_id(&self) -> &str {
        &self.id
    }

    fn module_id(&self) -> Result<Option<&str>, GroupError> {
        Ok(self.module.as_deref())
    }

    fn class_id(&self) -> Option<&str> {
        self.class.as_deref()
    }
}

/// Reorder `items` as a pure function of `seed` and the item identities.
///
/// Contiguous module groups are formed first, each shuffled internally by
/// class ([`shuffle_by_class`] semantics), then the module groups themselves
/// are ordered by the key of `"{seed}::{module}"` (sentinel `"None"` for
/// absent identity). The output is always a permutation of the input.
pub fn shuffle<T: CollectedItem>(seed: i64, items: Vec<T>) -> Vec<T> {
    let mut module_groups: Vec<(Option<String>, Vec<T>)> = Vec::new();
    for item in items {
        let module = match item.module_id() {
            Ok(module) => module.map(str::to_owned),
            Err(e) => {
                warn!(error = %e, "module resolution failed; grouping under the sentinel");
                None
            }
        };
        match module_groups.last_mut() {
            Some((current, group)) if *current == module => group.push(item),
            _ => module_groups.push((module, vec![item])),
        }
    }

    let mut module_groups: Vec<(Option<String>, Vec<T>)> = module_groups
        .into_iter()
        .map(|(module, group)| (module, shuffle_by_class(seed, group)))
        .collect();

    // Stable: equal keys (split groups of one module) keep input order.
    module_groups.sort_by_key(|(module, _)| group_key(seed, module.as_deref()));

    module_groups
        .into_iter()
        .flat_map(|(_, group)| group)
        .collect()
}

/// Contiguous class groups within one module group: members sorted by the
/// key of `"{seed}::{node_id}"`, then the class groups themselves by the key
/// of `"{seed}::{class}"` with the usual sentinel.
fn shuffle_by_class<T: CollectedItem>(seed: i64, items: Vec<T>) -> Vec<T> {
    let mut class_groups: Vec<(Option<String>, Vec<T>)> = Vec::new();
    for item in items {
        let class = item.class_id().map(str::to_owned);
        match class_groups.last_mut() {
            Some((current, group)) if *current == class => group.push(item),
            _ => class_groups.push((class, vec![item])),
        }
    }

    for (_, group) in &mut class_groups {
        group.sort_by_key(|item| key(&seed_string(seed, item.node_id())));
    }
    class_groups.sort_by_key(|(class, _)| group_key(seed, class.as_deref()));

    class_groups
        .into_iter()
        .flat_map(|(_, group)| group)
        .collect()
}

fn group_key(seed: i64, identity: Option<&str>) -> u32 {
    key(&seed_string(seed, identity.unwrap_or(NO_GROUP)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids<T: CollectedItem>(items: &[T]) -> Vec<&str> {
        items.iter().map(CollectedItem::node_id).collect()
    }

    fn one_per_module() -> Vec<TestItem> {
        vec![
            TestItem::new("mod_a::test_a").with_module("mod_a"),
            TestItem::new("mod_b::test_b").with_module("mod_b"),
            TestItem::new("mod_c::test_c").with_module("mod_c"),
            TestItem::new("mod_d::test_d").with_module("mod_d"),
        ]
    }

    #[test]
    fn four_modules_under_seed_15_yield_a_fixed_permutation() {
        // Module keys: crc32("15::mod_c") < "15::mod_b" < "15::mod_d" < "15::mod_a".
        let out = shuffle(15, one_per_module());
        assert_eq!(
            ids(&out),
            vec![
                "mod_c::test_c",
                "mod_b::test_b",
                "mod_d::test_d",
                "mod_a::test_a",
            ]
        );
    }

    #[test]
    fn repeated_invocations_are_byte_identical() {
        let first = shuffle(15, one_per_module());
        let second = shuffle(15, one_per_module());
        assert_eq!(first, second);
    }

    #[test]
    fn discovery_order_does_not_matter_for_contiguous_groups() {
        let mut reversed = one_per_module();
        reversed.reverse();
        assert_eq!(ids(&shuffle(15, one_per_module())), ids(&shuffle(15, reversed)));
    }

    #[test]
    fn items_within_a_module_sort_by_node_id_key() {
        // crc32("2::mod_x::test_a") < "2::mod_x::test_c" < "2::mod_x::test_b".
        let items = vec![
            TestItem::new("mod_x::test_a").with_module("mod_x"),
            TestItem::new("mod_x::test_b").with_module("mod_x"),
            TestItem::new("mod_x::test_c").with_module("mod_x"),
        ];
        let out = shuffle(2, items);
        assert_eq!(
            ids(&out),
            vec!["mod_x::test_a", "mod_x::test_c", "mod_x::test_b"]
        );
    }

    #[test]
    fn class_groups_sort_among_themselves_and_internally() {
        // Class keys under seed 7: "7::m.TestAlpha" < "7::None" < "7::m.TestBeta";
        // within TestAlpha: "7::m::TestAlpha::t2" < "7::m::TestAlpha::t1".
        let items = vec![
            TestItem::new("m::TestAlpha::t1")
                .with_module("m")
                .with_class("m.TestAlpha"),
            TestItem::new("m::TestAlpha::t2")
                .with_module("m")
                .with_class("m.TestAlpha"),
            TestItem::new("m::t3").with_module("m"),
            TestItem::new("m::TestBeta::t4")
                .with_module("m")
                .with_class("m.TestBeta"),
        ];
        let out = shuffle(7, items);
        assert_eq!(
            ids(&out),
            vec![
                "m::TestAlpha::t2",
                "m::TestAlpha::t1",
                "m::t3",
                "m::TestBeta::t4",
            ]
        );
    }

    #[test]
    fn moduleless_items_form_one_sentinel_group_ordered_like_any_other() {
        // Module keys under seed 4: "4::m2" < "4::None" < "4::m1";
        // within the sentinel group: "4::t_y" < "4::t_x".
        let items = vec![
            TestItem::new("m1::t1").with_module("m1"),
            TestItem::new("t_x"),
            TestItem::new("t_y"),
            TestItem::new("m2::t2").with_module("m2"),
        ];
        let out = shuffle(4, items);
        assert_eq!(ids(&out), vec!["m2::t2", "t_y", "t_x", "m1::t1"]);
    }

    #[test]
    fn non_contiguous_module_reappearance_forms_a_second_group() {
        // a1 and a2 share a module but are separated by b1: two "ma" groups
        // with equal keys, so the stable sort keeps their relative order.
        let items = vec![
            TestItem::new("ma::t1").with_module("ma"),
            TestItem::new("mb::t2").with_module("mb"),
            TestItem::new("ma::t3").with_module("ma"),
        ];
        let first = shuffle(5, items.clone());
        let second = shuffle(5, items);
        assert_eq!(first, second);
        // crc32("5::mb") < crc32("5::ma"): mb's group sorts first, and the
        // two ma groups stay in input order after it.
        assert_eq!(ids(&first), vec!["mb::t2", "ma::t1", "ma::t3"]);
    }

    #[test]
    fn failed_module_resolution_maps_to_the_sentinel_group() {
        struct Flaky(TestItem);

        impl CollectedItem for Flaky {
            fn node_id(&self) -> &str {
                self.0.node_id()
            }
            fn module_id(&self) -> Result<Option<&str>, GroupError> {
                Err(GroupError::new(self.0.node_id(), "import failed"))
            }
            fn class_id(&self) -> Option<&str> {
                None
            }
        }

        let items = vec![
            Flaky(TestItem::new("t_x")),
            Flaky(TestItem::new("t_y")),
        ];
        let out = shuffle(4, items);
        // Same order as the sentinel group in the explicit-None case above.
        assert_eq!(ids(&out), vec!["t_y", "t_x"]);
    }

    #[test]
    fn output_is_a_permutation_of_the_input() {
        let items = vec![
            TestItem::new("m::TestAlpha::t1")
                .with_module("m")
                .with_class("m.TestAlpha"),
            TestItem::new("m::t3").with_module("m"),
            TestItem::new("n::t4").with_module("n"),
            TestItem::new("t_lone"),
        ];
        let out = shuffle(99, items.clone());
        assert_eq!(out.len(), items.len());
        for item in &items {
            assert!(out.contains(item));
        }
    }

    #[test]
    fn empty_collection_shuffles_to_empty() {
        let out: Vec<TestItem> = shuffle(1, Vec::new());
        assert!(out.is_empty());
    }

    #[test]
    fn different_seeds_reorder_differently() {
        let seeds = [15, 16, 17];
        let orders: Vec<Vec<String>> = seeds
            .iter()
            .map(|&s| {
                shuffle(s, one_per_module())
                    .into_iter()
                    .map(|i| i.id)
                    .collect()
            })
            .collect();
        // Not guaranteed for every seed pair, but these three differ.
        assert!(orders[0] != orders[1] || orders[0] != orders[2]);
    }
}
