//! Category hierarchy for a run's age analysis.
//!
//! Rows come back from the store as distinct (category1, category2, category3)
//! triples. The hierarchy collapses them into one collection per level,
//! deduplicated on value equality of the whole entry.

use crate::{error::HazardResult, model::CategoryData};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChildCategory {
    pub parent: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryHierarchy {
    pub category1: Vec<String>,
    pub category2: Vec<ChildCategory>,
    pub category3: Vec<ChildCategory>,
}

/// Insertion-ordered set keyed on the serialized form of each entry.
struct ValueSet<T> {
    seen: HashSet<String>,
    items: Vec<T>,
}

impl<T: Serialize> ValueSet<T> {
    fn new() -> Self {
        Self { seen: HashSet::new(), items: Vec::new() }
    }

    fn insert(&mut self, item: T) -> HazardResult<bool> {
        let key = serde_json::to_string(&item)?;
        if !self.seen.insert(key) {
            return Ok(false);
        }
        self.items.push(item);
        Ok(true)
    }

    fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl CategoryHierarchy {
    pub fn build(rows: &[CategoryData]) -> HazardResult<Self> {
        let mut category1 = ValueSet::new();
        let mut category2 = ValueSet::new();
        let mut category3 = ValueSet::new();

        for row in rows {
            category1.insert(row.category1.clone())?;
            let Some(c2) = non_empty(&row.category2) else { continue };
            category2.insert(ChildCategory {
                parent: row.category1.clone(),
                value: c2.to_string(),
            })?;
            if let Some(c3) = non_empty(&row.category3) {
                category3.insert(ChildCategory {
                    parent: c2.to_string(),
                    value: c3.to_string(),
                })?;
            }
        }

        Ok(Self {
            category1: category1.into_vec(),
            category2: category2.into_vec(),
            category3: category3.into_vec(),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(c1: &str, c2: Option<&str>, c3: Option<&str>) -> CategoryData {
        CategoryData {
            category1: c1.to_string(),
            category2: c2.map(String::from),
            category3: c3.map(String::from),
        }
    }

    #[test]
    fn duplicates_collapse_by_value() {
        let rows = vec![
            row("Retail", Some("Cards"), Some("Gold")),
            row("Retail", Some("Cards"), Some("Silver")),
            row("Retail", Some("Loans"), None),
            row("Corporate", None, None),
            row("Retail", Some("Cards"), Some("Gold")),
        ];
        let hierarchy = CategoryHierarchy::build(&rows).unwrap();

        assert_eq!(hierarchy.category1, vec!["Retail", "Corporate"]);
        assert_eq!(hierarchy.category2.len(), 2);
        assert_eq!(hierarchy.category2[0], ChildCategory { parent: "Retail".into(), value: "Cards".into() });
        assert_eq!(hierarchy.category3.len(), 2);
        assert!(hierarchy.category3.iter().all(|c| c.parent == "Cards"));
    }

    #[test]
    fn category3_needs_category2() {
        let rows = vec![
            row("Retail", None, Some("Orphan")),
            row("Retail", Some(""), Some("Orphan")),
        ];
        let hierarchy = CategoryHierarchy::build(&rows).unwrap();

        assert_eq!(hierarchy.category1, vec!["Retail"]);
        assert!(hierarchy.category2.is_empty());
        assert!(hierarchy.category3.is_empty());
    }

    #[test]
    fn same_child_under_different_parents_is_kept() {
        let rows = vec![
            row("Retail", Some("Cards"), None),
            row("Corporate", Some("Cards"), None),
        ];
        let hierarchy = CategoryHierarchy::build(&rows).unwrap();
        assert_eq!(hierarchy.category2.len(), 2);
    }
}
