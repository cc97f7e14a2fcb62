//! Parsing of exported WhatsApp chat logs.
//!
//! Both export layouts are supported:
//!
//! ```text
//! 31/12/2023, 22:15 - Alice: see you tomorrow        (Android)
//! 12/31/23, 10:15 PM - Alice: see you tomorrow       (Android, 12-hour)
//! [31/12/2023, 22:15:07] Alice: see you tomorrow     (iOS)
//! ```
//!
//! A line that starts with a timestamp opens a new message, every other line
//! continues the previous one. Lines that cannot be attributed to a message
//! are skipped and counted rather than treated as fatal.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ParserConfig;
use crate::error::{ChatAnalyzerError, Result};
use crate::models::{ChatMessage, MessageFlags, GROUP_NOTIFICATION};

const MEDIA_MARKERS: [&str; 8] = [
    "<media omitted>",
    "image omitted",
    "video omitted",
    "audio omitted",
    "sticker omitted",
    "gif omitted",
    "document omitted",
    "<attached:",
];
const DELETED_MARKERS: [&str; 2] = ["this message was deleted", "you deleted this message"];
const EDITED_MARKER: &str = "<This message was edited>";
const CONTACT_MARKERS: [&str; 2] = [".vcf (file attached)", "contact card omitted"];
const LOCATION_MARKER: &str = "location: https://maps.google.com";

/// Order of the first two date components in export timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `31/12/2023`
    DayFirst,
    /// `12/31/2023`
    MonthFirst,
    /// Decide from the timestamps in the file
    Auto,
}

impl DateOrder {
    /// Stable name used in cache keys and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DayFirst => "day_first",
            Self::MonthFirst => "month_first",
            Self::Auto => "auto",
        }
    }
}

/// Which export flavour the file was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportLayout {
    /// `date, time - sender: text`
    Android,
    /// `[date, time] sender: text`
    Ios,
}

/// Output of a parse run
#[derive(Debug, Clone)]
pub struct ParsedChat {
    /// Messages in file order
    pub messages: Vec<ChatMessage>,
    /// Non-empty lines that could not be attributed to a message
    pub skipped_lines: usize,
    /// Layout of the first recognized line
    pub layout: ExportLayout,
    /// Date order actually used
    pub date_order: DateOrder,
}

#[derive(Debug, Clone)]
struct RawStamp {
    first: u32,
    second: u32,
    year: i32,
    hour: u32,
    minute: u32,
    seconds: u32,
    pm: Option<bool>,
}

#[derive(Debug)]
struct RawEntry {
    stamp: RawStamp,
    body: String,
    continuation: Vec<String>,
}

/// Line-oriented parser for chat exports
#[derive(Debug)]
pub struct ChatParser {
    date_order: DateOrder,
    android_line: Regex,
    ios_line: Regex,
    url_regex: Regex,
}

impl ChatParser {
    /// Compile the line patterns for the given settings
    pub fn new(config: &ParserConfig) -> Result<Self> {
        let stamp = r"(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{2,4}),?\s(\d{1,2})[:.](\d{2})(?:[:.](\d{2}))?(?:\s?([AaPp])\.?[Mm]\.?)?";
        let android_line = Regex::new(&format!(r"^{stamp}\s[-–]\s(.*)$"))
            .map_err(|e| ChatAnalyzerError::Other(format!("Failed to compile Android line regex: {e}")))?;
        let ios_line = Regex::new(&format!(r"^\[{stamp}\]\s(.*)$"))
            .map_err(|e| ChatAnalyzerError::Other(format!("Failed to compile iOS line regex: {e}")))?;
        let url_regex = Regex::new(r"(?i)https?://\S+|www\.\S+")
            .map_err(|e| ChatAnalyzerError::Other(format!("Failed to compile URL regex: {e}")))?;

        Ok(Self {
            date_order: config.date_order,
            android_line,
            ios_line,
            url_regex,
        })
    }

    /// Configured date order
    #[must_use]
    pub const fn date_order(&self) -> DateOrder {
        self.date_order
    }

    /// Parse a complete export into messages
    pub fn parse(&self, raw: &str) -> Result<ParsedChat> {
        let mut entries: Vec<RawEntry> = Vec::new();
        let mut skipped_lines = 0usize;
        let mut layout = None;

        for line in raw.lines() {
            let line = strip_marks(line);
            if let Some((stamp, body, line_layout)) = self.match_line(&line) {
                layout.get_or_insert(line_layout);
                entries.push(RawEntry {
                    stamp,
                    body,
                    continuation: Vec::new(),
                });
            } else if let Some(last) = entries.last_mut() {
                last.continuation.push(line);
            } else if !line.trim().is_empty() {
                skipped_lines += 1;
            }
        }

        let date_order = match self.date_order {
            DateOrder::Auto => detect_date_order(entries.iter().map(|e| &e.stamp)),
            fixed => fixed,
        };

        let mut messages = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(timestamp) = resolve_timestamp(&entry.stamp, date_order) else {
                debug!(body = %entry.body, "Skipping message with invalid timestamp");
                skipped_lines += 1 + entry.continuation.iter().filter(|l| !l.trim().is_empty()).count();
                continue;
            };
            messages.push(self.build_message(timestamp, &entry.body, &entry.continuation));
        }

        let layout = match layout {
            Some(layout) if !messages.is_empty() => layout,
            _ => return Err(ChatAnalyzerError::EmptyChat { skipped: skipped_lines }),
        };

        if skipped_lines > 0 {
            warn!(skipped_lines, "Skipped malformed lines while parsing chat export");
        }
        debug!(
            messages = messages.len(),
            ?layout,
            date_order = date_order.as_str(),
            "Parsed chat export"
        );

        Ok(ParsedChat {
            messages,
            skipped_lines,
            layout,
            date_order,
        })
    }

    fn match_line(&self, line: &str) -> Option<(RawStamp, String, ExportLayout)> {
        let (caps, layout) = if let Some(caps) = self.ios_line.captures(line) {
            (caps, ExportLayout::Ios)
        } else {
            (self.android_line.captures(line)?, ExportLayout::Android)
        };

        let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        let year_text = caps.get(3)?.as_str();
        let year: i32 = year_text.parse().ok()?;
        let year = if year_text.len() <= 2 { 2000 + year } else { year };

        let stamp = RawStamp {
            first: number(1)?,
            second: number(2)?,
            year,
            hour: number(4)?,
            minute: number(5)?,
            seconds: number(6).unwrap_or(0),
            pm: caps
                .get(7)
                .map(|m| m.as_str().eq_ignore_ascii_case("p")),
        };
        let body = caps.get(8).map_or_else(String::new, |m| m.as_str().to_string());
        Some((stamp, body, layout))
    }

    fn build_message(&self, timestamp: NaiveDateTime, body: &str, continuation: &[String]) -> ChatMessage {
        let (sender, first_line, notification) = match body.split_once(": ") {
            Some((sender, text)) if !sender.trim().is_empty() => (sender.trim().to_string(), text, false),
            _ => (GROUP_NOTIFICATION.to_string(), body, true),
        };

        let mut text = first_line.to_string();
        for line in continuation {
            text.push('\n');
            text.push_str(line);
        }

        let edited = text.contains(EDITED_MARKER);
        if edited {
            text = text.replace(EDITED_MARKER, "");
        }
        let text = text.trim().to_string();

        let flags = self.classify(&text, edited, notification);
        ChatMessage {
            sender,
            timestamp,
            text,
            flags,
        }
    }

    /// Classify message content by its placeholders and links
    #[must_use]
    pub fn classify(&self, text: &str, edited: bool, notification: bool) -> MessageFlags {
        let lower = text.to_lowercase();
        MessageFlags {
            media: MEDIA_MARKERS.iter().any(|m| lower.contains(m)),
            deleted: DELETED_MARKERS.iter().any(|m| lower.contains(m)),
            edited,
            shared_contact: CONTACT_MARKERS.iter().any(|m| lower.contains(m)),
            shared_location: lower.contains(LOCATION_MARKER),
            has_url: self.url_regex.is_match(text),
            notification,
        }
    }
}

/// Remove byte-order and directional marks that exports sprinkle into lines.
/// iOS wraps phone-number senders in embedding and isolate controls.
fn strip_marks(line: &str) -> String {
    line.chars()
        .filter(|c| {
            !matches!(
                c,
                '\u{feff}' | '\u{200e}' | '\u{200f}' | '\u{202a}'..='\u{202e}' | '\u{2066}'..='\u{2069}'
            )
        })
        .collect()
}

fn detect_date_order<'a>(stamps: impl Iterator<Item = &'a RawStamp>) -> DateOrder {
    let mut month_first_hint = false;
    for stamp in stamps {
        if stamp.first > 12 {
            return DateOrder::DayFirst;
        }
        if stamp.second > 12 {
            month_first_hint = true;
        }
    }
    if month_first_hint {
        DateOrder::MonthFirst
    } else {
        DateOrder::DayFirst
    }
}

fn resolve_timestamp(stamp: &RawStamp, order: DateOrder) -> Option<NaiveDateTime> {
    let (day, month) = match order {
        DateOrder::MonthFirst => (stamp.second, stamp.first),
        DateOrder::DayFirst | DateOrder::Auto => (stamp.first, stamp.second),
    };
    let date = NaiveDate::from_ymd_opt(stamp.year, month, day)?;

    let hour = match stamp.pm {
        None => stamp.hour,
        Some(_) if stamp.hour == 0 || stamp.hour > 12 => return None,
        Some(false) => stamp.hour % 12,
        Some(true) => stamp.hour % 12 + 12,
    };
    let time = NaiveTime::from_hms_opt(hour, stamp.minute, stamp.seconds)?;
    Some(NaiveDateTime::new(date, time))
}
