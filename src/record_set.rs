//! The parsed record set and the filtered views analyses run on.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::error::{ChatAnalyzerError, Result};
use crate::models::{ChatMessage, DateRange, UserSelection, OVERALL_USERS};

/// Immutable table of chat messages, ordered by timestamp
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    messages: Vec<ChatMessage>,
    users: Vec<String>,
}

impl RecordSet {
    /// Build a record set; messages are stably sorted by timestamp
    #[must_use]
    pub fn new(mut messages: Vec<ChatMessage>) -> Self {
        messages.sort_by_key(|m| m.timestamp);
        let users = messages
            .iter()
            .map(|m| m.sender.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self { messages, users }
    }

    /// Number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the record set holds no message
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All messages in timestamp order
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Unique senders, sorted
    #[must_use]
    pub fn users(&self) -> &[String] {
        &self.users
    }

    /// Whether `name` sent at least one message
    #[must_use]
    pub fn has_user(&self, name: &str) -> bool {
        self.users.binary_search_by(|u| u.as_str().cmp(name)).is_ok()
    }

    /// The user picker list: `"Overall Users"` first, then the sorted
    /// senders whose name contains `search` (case-insensitive)
    #[must_use]
    pub fn user_options(&self, search: &str) -> Vec<String> {
        let needle = search.trim().to_lowercase();
        std::iter::once(OVERALL_USERS)
            .chain(self.users.iter().map(String::as_str))
            .filter(|user| user.to_lowercase().contains(&needle))
            .map(ToString::to_string)
            .collect()
    }

    /// First and last message dates
    #[must_use]
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.messages.first()?.date();
        let last = self.messages.last()?.date();
        Some((first, last))
    }

    /// View over every message
    #[must_use]
    pub fn view(&self) -> View<'_> {
        View {
            rows: self.messages.iter().collect(),
        }
    }

    /// View restricted to the selected user
    pub fn select(&self, selection: &UserSelection) -> Result<View<'_>> {
        match selection {
            UserSelection::Overall => Ok(self.view()),
            UserSelection::User(name) => {
                if !self.has_user(name) {
                    return Err(ChatAnalyzerError::UnknownUser(name.clone()));
                }
                Ok(View {
                    rows: self.messages.iter().filter(|m| &m.sender == name).collect(),
                })
            }
        }
    }
}

/// A filtered, borrowed subset of a [`RecordSet`]
#[derive(Debug, Clone)]
pub struct View<'a> {
    rows: Vec<&'a ChatMessage>,
}

impl<'a> View<'a> {
    /// Keep only rows whose date is inside `range`
    #[must_use]
    pub fn within(self, range: &DateRange) -> Self {
        Self {
            rows: self.rows.into_iter().filter(|m| range.contains(m.date())).collect(),
        }
    }

    /// Keep only rows matching `predicate`
    #[must_use]
    pub fn filter(self, predicate: impl Fn(&ChatMessage) -> bool) -> Self {
        Self {
            rows: self.rows.into_iter().filter(|m| predicate(m)).collect(),
        }
    }

    /// Iterate over the rows
    pub fn iter(&self) -> impl Iterator<Item = &'a ChatMessage> + '_ {
        self.rows.iter().copied()
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the view is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Texts of rows written by participants (notifications excluded)
    #[must_use]
    pub fn user_texts(&self) -> Vec<&'a str> {
        self.rows
            .iter()
            .filter(|m| m.is_user_message())
            .map(|m| m.text.as_str())
            .collect()
    }
}
