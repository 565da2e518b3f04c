//! Tunables for the conversation wizards.

use crate::task::services::DeletePolicy;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Wizard limits and menus.
///
/// Deserialised from the `conversation` section of the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationSettings {
    /// Minimum task title length in characters.
    pub title_min_chars: usize,
    /// Minimum first or last name length in characters.
    pub name_min_chars: usize,
    /// Reminder intervals offered by the interval menu, in minutes.
    pub interval_choices_minutes: Vec<u32>,
    /// Time-of-day slots offered after a day is picked, as `HH:MM`.
    pub time_slots: Vec<String>,
    /// Users shown per page of the assignee picker.
    pub assignee_page_size: usize,
    /// Who may delete a task.
    pub delete_policy: DeletePolicy,
    /// Lowercase answers that skip the description.
    pub description_skip_tokens: Vec<String>,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            title_min_chars: 3,
            name_min_chars: 2,
            interval_choices_minutes: vec![15, 30, 60, 120, 240, 480, 1440],
            time_slots: (9..=20).map(|hour| format!("{hour:02}:00")).collect(),
            assignee_page_size: 5,
            delete_policy: DeletePolicy::default(),
            description_skip_tokens: ["skip", "-", "none"]
                .into_iter()
                .map(ToOwned::to_owned)
                .collect(),
        }
    }
}

impl ConversationSettings {
    /// Parses the configured time slots, dropping malformed entries.
    #[must_use]
    pub fn parsed_time_slots(&self) -> Vec<NaiveTime> {
        let mut slots: Vec<NaiveTime> = self
            .time_slots
            .iter()
            .filter_map(|slot| parse_slot(slot))
            .collect();
        slots.sort_unstable();
        slots.dedup();
        slots
    }

    /// Returns `true` when `text` is one of the description skip tokens.
    #[must_use]
    pub fn is_skip_token(&self, text: &str) -> bool {
        let lowered = text.trim().to_lowercase();
        self.description_skip_tokens
            .iter()
            .any(|token| token.eq_ignore_ascii_case(&lowered))
    }
}

/// Parses one `HH:MM` slot.
#[must_use]
pub fn parse_slot(slot: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(slot.trim(), "%H:%M").ok()
}
