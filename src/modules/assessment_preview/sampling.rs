//! Question pool sampling.
//!
//! Assessments draw `total_items` exam items uniformly at random, without
//! replacement, from every section of the modules scoped to the assessment.
//! The draw is then put back into course order (module position, then section
//! position) so students meet questions in the order the material is taught.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use lms_core::text::module_title_or_default;

/// One exam item with the module and section it was written for.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct PoolItem {
    pub module_id: i64,
    pub module_position: i32,
    #[serde(skip_serializing)]
    pub content_html: Option<String>,
    pub section_id: i64,
    pub section_title: String,
    pub section_position: i32,
    pub item_id: i64,
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: String,
}

impl PoolItem {
    pub fn module_title(&self) -> String {
        module_title_or_default(self.content_html.as_deref(), self.module_position)
    }
}

/// Draws up to `count` items without replacement, sorted into course order.
///
/// When the pool holds fewer than `count` items, all of them are returned.
pub fn sample_in_course_order<R: Rng + ?Sized>(
    pool: &[PoolItem],
    count: usize,
    rng: &mut R,
) -> Vec<PoolItem> {
    let mut picked: Vec<PoolItem> = pool.choose_multiple(rng, count).cloned().collect();
    picked.sort_by_key(|item| (item.module_position, item.section_position));
    picked
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Distribution {
    /// Keyed by `"{position}: {module title}"`.
    pub module_distribution: BTreeMap<String, usize>,
    /// Keyed by section title.
    pub section_distribution: BTreeMap<String, usize>,
}

pub fn distribution(items: &[PoolItem]) -> Distribution {
    let mut stats = Distribution::default();
    for item in items {
        let module_key = format!("{}: {}", item.module_position, item.module_title());
        *stats.module_distribution.entry(module_key).or_default() += 1;
        *stats
            .section_distribution
            .entry(item.section_title.clone())
            .or_default() += 1;
    }
    stats
}

#[cfg(test)]
pub(crate) fn pool_item(item_id: i64, module_position: i32, section_position: i32) -> PoolItem {
    PoolItem {
        module_id: module_position as i64,
        module_position,
        content_html: Some(format!("<h2>Unit {}</h2>", module_position)),
        section_id: (module_position * 10 + section_position) as i64,
        section_title: format!("Section {}.{}", module_position, section_position),
        section_position,
        item_id,
        question: format!("Question {}?", item_id),
        option_a: "a".to_string(),
        option_b: "b".to_string(),
        option_c: "c".to_string(),
        option_d: "d".to_string(),
        correct_answer: "A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn pool() -> Vec<PoolItem> {
        let mut items = Vec::new();
        let mut id = 1;
        for module in [3, 1, 2] {
            for section in [2, 1] {
                for _ in 0..3 {
                    items.push(pool_item(id, module, section));
                    id += 1;
                }
            }
        }
        items
    }

    #[test]
    fn test_sample_has_no_duplicates_and_right_size() {
        let pool = pool();
        let mut rng = StdRng::seed_from_u64(7);
        let picked = sample_in_course_order(&pool, 10, &mut rng);

        assert_eq!(picked.len(), 10);
        let ids: HashSet<i64> = picked.iter().map(|i| i.item_id).collect();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn test_sample_is_in_course_order() {
        let pool = pool();
        let mut rng = StdRng::seed_from_u64(42);
        let picked = sample_in_course_order(&pool, 12, &mut rng);

        let keys: Vec<(i32, i32)> = picked
            .iter()
            .map(|i| (i.module_position, i.section_position))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_sample_larger_than_pool_returns_everything() {
        let pool = pool();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sample_in_course_order(&pool, 100, &mut rng).len(), pool.len());
        assert!(sample_in_course_order(&[], 5, &mut rng).is_empty());
    }

    #[test]
    fn test_distribution_counts() {
        let items = vec![pool_item(1, 1, 1), pool_item(2, 1, 1), pool_item(3, 2, 1)];
        let stats = distribution(&items);

        assert_eq!(stats.module_distribution["1: Unit 1"], 2);
        assert_eq!(stats.module_distribution["2: Unit 2"], 1);
        assert_eq!(stats.section_distribution["Section 1.1"], 2);
        assert_eq!(stats.section_distribution["Section 2.1"], 1);
    }

    #[test]
    fn test_module_title_fallback() {
        let mut item = pool_item(1, 4, 1);
        item.content_html = None;
        assert_eq!(item.module_title(), "Module 4");
    }
}
