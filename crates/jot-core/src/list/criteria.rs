//! Filter criteria and the matching rules.

use crate::note::{Category, Note};
use serde::{Deserialize, Serialize};

/// Category selection: a single category, or the sentinel that disables
/// the category condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

/// The locally held search term and category selection. Never sent to
/// the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Free-text search term; empty matches everything.
    pub search: String,
    pub category: CategoryFilter,
}

impl FilterCriteria {
    /// Whether `note` satisfies both conditions.
    ///
    /// Search is a case-insensitive substring match against title OR
    /// content; category is an exact match unless the filter is `All`.
    /// The two combine with logical AND.
    pub fn matches(&self, note: &Note) -> bool {
        let search_ok = self.search.is_empty() || {
            let needle = self.search.to_lowercase();
            note.title.to_lowercase().contains(&needle)
                || note.content.to_lowercase().contains(&needle)
        };

        let category_ok = match self.category {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => note.category == category,
        };

        search_ok && category_ok
    }
}

/// Pure derivation of the visible subset: exactly the notes matching
/// `criteria`, in working-set order.
pub fn filter_notes<'a>(notes: &'a [Note], criteria: &FilterCriteria) -> Vec<&'a Note> {
    notes.iter().filter(|note| criteria.matches(note)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn note(title: &str, content: &str, category: Category) -> Note {
        let now = Utc::now();
        Note {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            category,
            user_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample() -> Vec<Note> {
        vec![
            note("Groceries", "milk, eggs", Category::General),
            note("Standup notes", "status updates", Category::Work),
            note("Idea: backup tool", "sync to external drive", Category::Ideas),
        ]
    }

    fn titles(notes: &[&Note]) -> Vec<String> {
        notes.iter().map(|n| n.title.clone()).collect()
    }

    #[test]
    fn test_search_matches_title_or_content_case_insensitive() {
        let notes = sample();
        let criteria = FilterCriteria {
            search: "NOTES".into(),
            category: CategoryFilter::All,
        };
        assert_eq!(titles(&filter_notes(&notes, &criteria)), ["Standup notes"]);

        let criteria = FilterCriteria {
            search: "milk".into(),
            category: CategoryFilter::All,
        };
        assert_eq!(titles(&filter_notes(&notes, &criteria)), ["Groceries"]);
    }

    #[test]
    fn test_category_filter_exact_match() {
        let notes = sample();
        let criteria = FilterCriteria {
            search: String::new(),
            category: CategoryFilter::Only(Category::Ideas),
        };
        assert_eq!(
            titles(&filter_notes(&notes, &criteria)),
            ["Idea: backup tool"]
        );
    }

    #[test]
    fn test_empty_criteria_matches_everything_in_order() {
        let notes = sample();
        let visible = filter_notes(&notes, &FilterCriteria::default());
        assert_eq!(
            titles(&visible),
            ["Groceries", "Standup notes", "Idea: backup tool"]
        );
    }

    #[test]
    fn test_conditions_combine_with_and() {
        let notes = sample();
        let criteria = FilterCriteria {
            search: "notes".into(),
            category: CategoryFilter::Only(Category::Ideas),
        };
        assert!(filter_notes(&notes, &criteria).is_empty());
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let notes = sample();
        let criteria = FilterCriteria {
            search: "e".into(),
            category: CategoryFilter::All,
        };
        let first = titles(&filter_notes(&notes, &criteria));
        let second = titles(&filter_notes(&notes, &criteria));
        assert_eq!(first, second);
    }
}
