//! Sentiment distribution and trend of a view.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{CountBucket, SentimentLabel};
use crate::nlp::{is_textual, NlpProcessor};
use crate::record_set::View;

/// Count of one sentiment label on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentPoint {
    pub date: String,
    pub sentiment: SentimentLabel,
    pub count: usize,
}

/// Result of the "Sentiment Analysis" view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    /// Messages per label, positive first
    pub distribution: Vec<CountBucket>,
    /// Messages per (date, label), oldest first; labels without messages on
    /// a date are omitted
    pub trend: Vec<SentimentPoint>,
    /// Mean score over scored messages
    pub mean_score: f32,
    /// Messages that were scored
    pub scored_messages: usize,
}

/// Score every textual message in the view and aggregate the labels
#[must_use]
pub fn sentiment_report(view: &View<'_>, nlp: &NlpProcessor, neutral_band: f32) -> SentimentReport {
    let mut distribution: BTreeMap<SentimentLabel, usize> = BTreeMap::new();
    let mut trend: BTreeMap<(chrono::NaiveDate, SentimentLabel), usize> = BTreeMap::new();
    let mut score_sum = 0.0_f64;
    let mut scored_messages = 0usize;

    for message in view.iter().filter(|m| is_textual(m)) {
        let score = nlp.analyze_sentiment(&message.text);
        let label = NlpProcessor::classify_sentiment(score, neutral_band);
        *distribution.entry(label).or_insert(0) += 1;
        *trend.entry((message.date(), label)).or_insert(0) += 1;
        score_sum += f64::from(score);
        scored_messages += 1;
    }

    let mean_score = if scored_messages == 0 {
        0.0
    } else {
        (score_sum / scored_messages as f64) as f32
    };

    SentimentReport {
        distribution: SentimentLabel::ALL
            .iter()
            .map(|label| CountBucket::new(label.to_string(), distribution.get(label).copied().unwrap_or(0)))
            .collect(),
        trend: trend
            .into_iter()
            .map(|((date, sentiment), count)| SentimentPoint {
                date: date.format("%Y-%m-%d").to_string(),
                sentiment,
                count,
            })
            .collect(),
        mean_score,
        scored_messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatMessage, MessageFlags};
    use crate::record_set::RecordSet;
    use chrono::NaiveDateTime;

    fn message(day: u32, text: &str, flags: MessageFlags) -> ChatMessage {
        ChatMessage {
            sender: "Alice".to_string(),
            timestamp: NaiveDateTime::parse_from_str(&format!("2024-05-{day:02} 08:00"), "%Y-%m-%d %H:%M")
                .expect("valid timestamp"),
            text: text.to_string(),
            flags,
        }
    }

    #[test]
    fn test_sentiment_report() {
        let media = MessageFlags {
            media: true,
            ..MessageFlags::default()
        };
        let set = RecordSet::new(vec![
            message(1, "this is great, thanks!", MessageFlags::default()),
            message(1, "I hate waiting", MessageFlags::default()),
            message(2, "meeting at noon", MessageFlags::default()),
            message(2, "<Media omitted>", media),
        ]);
        let nlp = NlpProcessor::new().expect("processor");
        let report = sentiment_report(&set.view(), &nlp, 0.05);

        assert_eq!(report.scored_messages, 3);
        assert_eq!(
            report.distribution,
            vec![
                CountBucket::new("Positive", 1),
                CountBucket::new("Neutral", 1),
                CountBucket::new("Negative", 1),
            ]
        );
        assert_eq!(report.trend.len(), 3);
        assert_eq!(report.trend[0].date, "2024-05-01");
        let trend_total: usize = report.trend.iter().map(|p| p.count).sum();
        assert_eq!(trend_total, report.scored_messages);
    }
}
