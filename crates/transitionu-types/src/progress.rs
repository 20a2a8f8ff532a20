//! Checklist progress aggregation: per-category counts and an overall
//! completion percentage over a set of items joined with user progress.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::api::ChecklistItemWithProgress;
use crate::models::ChecklistStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryProgress {
    pub total: u32,
    pub completed: u32,
    pub in_progress: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverallProgress {
    pub total: u32,
    pub completed: u32,
    pub in_progress: u32,
    pub percentage: u32,
}

/// Floor of completed/total as a whole percentage. Zero items means zero
/// percent, never a division by zero.
pub fn completion_percentage(completed: u32, total: u32) -> u32 {
    if total == 0 {
        0
    } else {
        completed * 100 / total
    }
}

/// Group items-with-progress by category id ("uncategorized" for items
/// without one) and compute the overall totals across all categories.
pub fn summarize(
    items: &[ChecklistItemWithProgress],
) -> (BTreeMap<String, CategoryProgress>, OverallProgress) {
    let mut categories: BTreeMap<String, CategoryProgress> = BTreeMap::new();

    for item in items {
        let key = item
            .category_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "uncategorized".to_string());
        let entry = categories.entry(key).or_default();
        entry.total += 1;
        match item.progress.status {
            ChecklistStatus::Completed => entry.completed += 1,
            ChecklistStatus::InProgress => entry.in_progress += 1,
            ChecklistStatus::NotStarted | ChecklistStatus::Skipped => {}
        }
    }

    let mut overall = OverallProgress::default();
    for progress in categories.values() {
        overall.total += progress.total;
        overall.completed += progress.completed;
        overall.in_progress += progress.in_progress;
    }
    overall.percentage = completion_percentage(overall.completed, overall.total);

    (categories, overall)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ProgressInfo;
    use uuid::Uuid;

    fn item(category: Option<Uuid>, status: ChecklistStatus) -> ChecklistItemWithProgress {
        ChecklistItemWithProgress {
            id: Uuid::new_v4(),
            category_id: category,
            title: "task".into(),
            description: None,
            estimated_time: None,
            difficulty: None,
            display_order: 0,
            required: true,
            visa_specific: false,
            visa_types: vec![],
            resources: vec![],
            progress: ProgressInfo {
                status,
                notes: None,
                completed_at: None,
            },
        }
    }

    #[test]
    fn half_completed_is_fifty_percent() {
        let cat = Uuid::new_v4();
        let items = vec![
            item(Some(cat), ChecklistStatus::Completed),
            item(Some(cat), ChecklistStatus::Completed),
            item(Some(cat), ChecklistStatus::NotStarted),
            item(Some(cat), ChecklistStatus::NotStarted),
        ];

        let (categories, overall) = summarize(&items);
        assert_eq!(overall.percentage, 50);
        assert_eq!(
            categories[&cat.to_string()],
            CategoryProgress {
                total: 4,
                completed: 2,
                in_progress: 0
            }
        );
    }

    #[test]
    fn empty_set_is_zero_percent() {
        let (categories, overall) = summarize(&[]);
        assert!(categories.is_empty());
        assert_eq!(overall.percentage, 0);
        assert_eq!(overall.total, 0);
    }

    #[test]
    fn percentage_floors() {
        // 1 of 3 completed is 33, not 33.3 rounded up
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(2, 3), 66);
        assert_eq!(completion_percentage(3, 3), 100);
    }

    #[test]
    fn skipped_counts_toward_total_but_not_completed() {
        let cat = Uuid::new_v4();
        let items = vec![
            item(Some(cat), ChecklistStatus::Completed),
            item(Some(cat), ChecklistStatus::Skipped),
        ];
        let (_, overall) = summarize(&items);
        assert_eq!(overall.total, 2);
        assert_eq!(overall.completed, 1);
        assert_eq!(overall.percentage, 50);
    }

    #[test]
    fn uncategorized_items_get_their_own_bucket() {
        let items = vec![item(None, ChecklistStatus::InProgress)];
        let (categories, overall) = summarize(&items);
        assert_eq!(categories["uncategorized"].in_progress, 1);
        assert_eq!(overall.in_progress, 1);
    }
}
