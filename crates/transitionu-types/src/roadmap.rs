//! Roadmap task cards: a coarse transition plan where each card bundles a
//! handful of subtasks. A card is done only when every subtask is done.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapCard {
    pub id: String,
    pub title: String,
    pub description: String,
    pub total_subtasks: u32,
    pub completed_subtasks: u32,
}

impl RoadmapCard {
    /// Complete means all subtasks done; a card with no subtasks is never
    /// counted as complete.
    pub fn is_complete(&self) -> bool {
        self.total_subtasks > 0 && self.completed_subtasks == self.total_subtasks
    }

    pub fn progress_text(&self) -> String {
        if self.is_complete() {
            "Done".to_string()
        } else {
            format!(
                "{} of {} completed",
                self.completed_subtasks, self.total_subtasks
            )
        }
    }
}

pub fn completed_cards(cards: &[RoadmapCard]) -> usize {
    cards.iter().filter(|c| c.is_complete()).count()
}

pub fn completion_percentage(cards: &[RoadmapCard]) -> u32 {
    crate::progress::completion_percentage(completed_cards(cards) as u32, cards.len() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, title: &str, total: u32, completed: u32) -> RoadmapCard {
        RoadmapCard {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            total_subtasks: total,
            completed_subtasks: completed,
        }
    }

    #[test]
    fn register_for_classes_progress_text() {
        let mut c = card("m3", "Register for Classes", 3, 0);
        assert!(!c.is_complete());
        assert_eq!(c.progress_text(), "0 of 3 completed");

        c.completed_subtasks = 3;
        assert!(c.is_complete());
        assert_eq!(c.progress_text(), "Done");
    }

    #[test]
    fn card_without_subtasks_is_never_complete() {
        let c = card("o2", "Learn Basic Phrases", 0, 0);
        assert!(!c.is_complete());
        assert_eq!(c.progress_text(), "0 of 0 completed");
    }

    #[test]
    fn completed_card_count() {
        let cards = vec![
            card("m1", "Apply for Student Visa", 5, 2),
            card("m2", "Find Accommodation", 4, 4),
            card("m3", "Register for Classes", 3, 0),
            card("m4", "Open Local Bank Account", 2, 1),
        ];
        assert_eq!(completed_cards(&cards), 1);
        assert_eq!(completion_percentage(&cards), 25);
    }
}
