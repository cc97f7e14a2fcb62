//! Counting aggregates over a view: headline statistics, activity rankings
//! and user comparisons.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChatAnalyzerError, Result};
use crate::models::{CountBucket, DateRange, UserSelection};
use crate::nlp::NlpProcessor;
use crate::record_set::{RecordSet, View};

/// Headline numbers of the "User Statistics" view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageStats {
    pub total_messages: usize,
    pub total_words: usize,
    pub media_messages: usize,
    pub links_shared: usize,
    pub emojis_shared: usize,
    pub deleted_messages: usize,
    pub edited_messages: usize,
    pub contacts_shared: usize,
    pub locations_shared: usize,
}

/// A sender's message count and share of the view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserShare {
    pub user: String,
    pub count: usize,
    /// Percentage of participant messages, rounded to two decimals
    pub percent: f64,
}

/// Most and least active senders
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusyUsers {
    /// Most active first
    pub most_active: Vec<UserShare>,
    /// Least active first
    pub least_active: Vec<UserShare>,
}

/// Count the headline statistics of a view
#[must_use]
pub fn fetch_stats(view: &View<'_>, nlp: &NlpProcessor) -> MessageStats {
    let mut stats = MessageStats {
        total_messages: view.len(),
        ..MessageStats::default()
    };

    for message in view.iter() {
        let flags = &message.flags;
        if flags.media {
            stats.media_messages += 1;
        } else {
            stats.total_words += message.text.split_whitespace().count();
        }
        stats.links_shared += nlp.count_urls(&message.text);
        stats.emojis_shared += nlp.extract_emojis(&message.text).len();
        stats.deleted_messages += usize::from(flags.deleted);
        stats.edited_messages += usize::from(flags.edited);
        stats.contacts_shared += usize::from(flags.shared_contact);
        stats.locations_shared += usize::from(flags.shared_location);
    }

    debug!(?stats, "Computed message statistics");
    stats
}

/// Messages per sender, most active first; counts sum to `view.len()`
#[must_use]
pub fn count_by_user(view: &View<'_>) -> Vec<CountBucket> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for message in view.iter() {
        *counts.entry(message.sender.as_str()).or_insert(0) += 1;
    }
    let mut buckets: Vec<CountBucket> = counts
        .into_iter()
        .map(|(user, count)| CountBucket::new(user, count))
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    buckets
}

/// Top and bottom `n` participants by message count
///
/// System notifications are not a participant and are left out.
#[must_use]
pub fn most_least_busy_users(view: &View<'_>, n: usize) -> BusyUsers {
    let participants: Vec<CountBucket> = count_by_user(&view.clone().filter(|m| m.is_user_message()));
    let total: usize = participants.iter().map(|b| b.count).sum();

    let share = |bucket: &CountBucket| UserShare {
        user: bucket.label.clone(),
        count: bucket.count,
        percent: if total == 0 {
            0.0
        } else {
            (bucket.count as f64 * 10_000.0 / total as f64).round() / 100.0
        },
    };

    let most_active = participants.iter().take(n).map(share).collect();

    let mut ascending = participants.clone();
    ascending.sort_by(|a, b| a.count.cmp(&b.count).then_with(|| a.label.cmp(&b.label)));
    let least_active = ascending.iter().take(n).map(share).collect();

    BusyUsers {
        most_active,
        least_active,
    }
}

/// Message counts of the chosen users inside `range`, in the order given
///
/// Duplicate names are counted once.
pub fn perform_comparative_analysis(
    records: &RecordSet,
    users: &[String],
    range: &DateRange,
) -> Result<Vec<CountBucket>> {
    if users.is_empty() {
        return Err(ChatAnalyzerError::InvalidArgument(
            "select at least one user to compare".to_string(),
        ));
    }

    let mut seen: BTreeMap<&str, ()> = BTreeMap::new();
    let mut buckets = Vec::with_capacity(users.len());
    for user in users {
        if seen.insert(user.as_str(), ()).is_some() {
            continue;
        }
        let count = records
            .select(&UserSelection::User(user.clone()))?
            .within(range)
            .len();
        buckets.push(CountBucket::new(user.clone(), count));
    }
    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatMessage, MessageFlags, GROUP_NOTIFICATION};
    use chrono::NaiveDateTime;

    fn message(sender: &str, day: u32, text: &str, flags: MessageFlags) -> ChatMessage {
        ChatMessage {
            sender: sender.to_string(),
            timestamp: NaiveDateTime::parse_from_str(&format!("2024-03-{day:02} 12:00"), "%Y-%m-%d %H:%M")
                .expect("valid timestamp"),
            text: text.to_string(),
            flags,
        }
    }

    fn sample() -> RecordSet {
        let media = MessageFlags {
            media: true,
            ..MessageFlags::default()
        };
        let url = MessageFlags {
            has_url: true,
            ..MessageFlags::default()
        };
        let notification = MessageFlags {
            notification: true,
            ..MessageFlags::default()
        };
        RecordSet::new(vec![
            message("Alice", 1, "hello there 👋", MessageFlags::default()),
            message("Alice", 2, "<Media omitted>", media),
            message("Bob", 2, "see https://a.example and https://b.example", url),
            message("Alice", 3, "ok", MessageFlags::default()),
            message(GROUP_NOTIFICATION, 3, "Carol joined", notification),
        ])
    }

    #[test]
    fn test_fetch_stats() {
        let set = sample();
        let nlp = NlpProcessor::new().expect("processor");
        let stats = fetch_stats(&set.view(), &nlp);
        assert_eq!(stats.total_messages, 5);
        assert_eq!(stats.media_messages, 1);
        assert_eq!(stats.links_shared, 2);
        assert_eq!(stats.emojis_shared, 1);
        assert_eq!(stats.total_words, 3 + 5 + 1 + 2);
    }

    #[test]
    fn test_busy_users_exclude_notifications() {
        let set = sample();
        let busy = most_least_busy_users(&set.view(), 5);
        assert_eq!(busy.most_active[0].user, "Alice");
        assert_eq!(busy.most_active[0].count, 3);
        assert!((busy.most_active[0].percent - 75.0).abs() < f64::EPSILON);
        assert_eq!(busy.least_active[0].user, "Bob");
        assert!(busy.most_active.iter().all(|u| u.user != GROUP_NOTIFICATION));
    }

    #[test]
    fn test_count_by_user_sums_to_total() {
        let set = sample();
        let view = set.view();
        let total: usize = count_by_user(&view).iter().map(|b| b.count).sum();
        assert_eq!(total, view.len());
    }

    #[test]
    fn test_comparative_analysis() {
        let set = sample();
        let range = DateRange::parse(Some("2024-03-02"), Some("2024-03-03")).expect("range");
        let users = vec!["Alice".to_string(), "Bob".to_string(), "Alice".to_string()];
        let buckets = perform_comparative_analysis(&set, &users, &range).expect("known users");
        assert_eq!(buckets, vec![CountBucket::new("Alice", 2), CountBucket::new("Bob", 1)]);

        let unknown = vec!["Zed".to_string()];
        assert!(perform_comparative_analysis(&set, &unknown, &range).is_err());
    }
}
