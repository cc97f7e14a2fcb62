//! Data models for parsed chat messages
//!
//! This module contains the record type produced by the parser, the
//! selections used to filter it, and the small value types shared by the
//! aggregation modules.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ChatAnalyzerError;

/// Sender recorded for system lines that carry no author.
pub const GROUP_NOTIFICATION: &str = "group_notification";

/// Label the dashboard uses for "all users".
pub const OVERALL_USERS: &str = "Overall Users";

/// Content markers detected while parsing a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFlags {
    /// Media placeholder (`<Media omitted>`, `image omitted`, ...)
    pub media: bool,
    /// Deleted message placeholder
    pub deleted: bool,
    /// Carried the `<This message was edited>` marker
    pub edited: bool,
    /// Shared a contact card
    pub shared_contact: bool,
    /// Shared a location pin
    pub shared_location: bool,
    /// Contains at least one URL
    pub has_url: bool,
    /// System line without a sender
    pub notification: bool,
}

impl MessageFlags {
    /// Short comma-separated list of the flags that are set.
    #[must_use]
    pub fn labels(&self) -> String {
        let mut labels = Vec::new();
        for (set, name) in [
            (self.media, "media"),
            (self.deleted, "deleted"),
            (self.edited, "edited"),
            (self.shared_contact, "contact"),
            (self.shared_location, "location"),
            (self.has_url, "url"),
            (self.notification, "notification"),
        ] {
            if set {
                labels.push(name);
            }
        }
        labels.join(",")
    }
}

/// A single message of the parsed chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Name (or phone number) of the sender
    pub sender: String,
    /// Wall-clock time the message was sent, as written in the export
    pub timestamp: NaiveDateTime,
    /// Message body; continuation lines are joined with `\n`
    pub text: String,
    /// Content classification
    pub flags: MessageFlags,
}

impl ChatMessage {
    /// Calendar date of the message
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Hour of day (0-23)
    #[must_use]
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    /// Day of the week
    #[must_use]
    pub fn weekday(&self) -> Weekday {
        self.timestamp.weekday()
    }

    /// Calendar month (1-12)
    #[must_use]
    pub fn month(&self) -> u32 {
        self.timestamp.month()
    }

    /// One-hour bucket label such as `"13-14"`
    #[must_use]
    pub fn period(&self) -> String {
        period_label(self.hour())
    }

    /// Whether this row was written by a participant rather than the system
    #[must_use]
    pub fn is_user_message(&self) -> bool {
        !self.flags.notification
    }
}

/// Label of the one-hour bucket starting at `hour`.
#[must_use]
pub fn period_label(hour: u32) -> String {
    format!("{:02}-{:02}", hour, (hour + 1) % 24)
}

/// Date range for filtering messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Start date (inclusive, optional)
    pub start: Option<NaiveDate>,
    /// End date (inclusive, optional)
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Range covering every date
    #[must_use]
    pub const fn all() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Range between two inclusive bounds
    #[must_use]
    pub const fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Whether `date` falls inside the range
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }

    /// Parse optional `YYYY-MM-DD` bounds
    pub fn parse(start: Option<&str>, end: Option<&str>) -> crate::error::Result<Self> {
        let parse_one = |value: &str| {
            NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
                ChatAnalyzerError::InvalidDate(format!("{value}: {e}, use YYYY-MM-DD"))
            })
        };
        Ok(Self {
            start: start.map(parse_one).transpose()?,
            end: end.map(parse_one).transpose()?,
        })
    }
}

/// Which participants an analysis looks at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserSelection {
    /// Every sender in the chat
    Overall,
    /// A single sender
    User(String),
}

impl UserSelection {
    /// Build a selection from an optional user name
    #[must_use]
    pub fn from_option(user: Option<&str>) -> Self {
        match user {
            None => Self::Overall,
            Some(name) => name.parse().unwrap_or(Self::Overall),
        }
    }

    /// Whether every sender is selected
    #[must_use]
    pub const fn is_overall(&self) -> bool {
        matches!(self, Self::Overall)
    }
}

impl FromStr for UserSelection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(OVERALL_USERS) {
            Ok(Self::Overall)
        } else {
            Ok(Self::User(trimmed.to_string()))
        }
    }
}

impl fmt::Display for UserSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overall => f.write_str(OVERALL_USERS),
            Self::User(name) => f.write_str(name),
        }
    }
}

/// Output format for exported messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Comma-separated values format
    Csv,
    /// Plain text format
    Txt,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ChatAnalyzerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Txt),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(ChatAnalyzerError::InvalidArgument(format!(
                "unknown output format: {other} (expected txt, csv or json)"
            ))),
        }
    }
}

/// Coarse sentiment class of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SentimentLabel {
    /// Score above the neutral band
    Positive,
    /// Score inside the neutral band
    Neutral,
    /// Score below the neutral band
    Negative,
}

impl SentimentLabel {
    /// All labels in display order
    pub const ALL: [Self; 3] = [Self::Positive, Self::Neutral, Self::Negative];
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
        })
    }
}

/// A labelled count, one bar or point of a chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountBucket {
    /// Bucket label (user name, date, month, weekday, ...)
    pub label: String,
    /// Number of messages in the bucket
    pub count: usize,
}

impl CountBucket {
    /// Create a bucket
    pub fn new(label: impl Into<String>, count: usize) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Sum of the counts of a series
#[must_use]
pub fn total_count(buckets: &[CountBucket]) -> usize {
    buckets.iter().map(|b| b.count).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_label_wraps_midnight() {
        assert_eq!(period_label(0), "00-01");
        assert_eq!(period_label(13), "13-14");
        assert_eq!(period_label(23), "23-00");
    }

    #[test]
    fn test_user_selection_parsing() {
        assert_eq!("Overall Users".parse::<UserSelection>().ok(), Some(UserSelection::Overall));
        assert_eq!(
            " Alice ".parse::<UserSelection>().ok(),
            Some(UserSelection::User("Alice".to_string()))
        );
        assert!(UserSelection::from_option(None).is_overall());
    }

    #[test]
    fn test_date_range_contains() {
        let range = DateRange::parse(Some("2024-01-01"), Some("2024-01-31")).expect("valid range");
        let inside = NaiveDate::from_ymd_opt(2024, 1, 31).expect("valid date");
        let outside = NaiveDate::from_ymd_opt(2024, 2, 1).expect("valid date");
        assert!(range.contains(inside));
        assert!(!range.contains(outside));
        assert!(DateRange::all().contains(outside));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("CSV".parse::<OutputFormat>().ok(), Some(OutputFormat::Csv));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_flag_labels() {
        let flags = MessageFlags {
            media: true,
            has_url: true,
            ..MessageFlags::default()
        };
        assert_eq!(flags.labels(), "media,url");
    }
}
