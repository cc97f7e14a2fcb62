//! The analysis menu: one entry point that turns a record set, a user
//! selection and a date range into the data behind each dashboard view.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::AnalysisConfig;
use crate::error::{ChatAnalyzerError, Result};
use crate::models::{CountBucket, DateRange, UserSelection, GROUP_NOTIFICATION};
use crate::nlp::{is_textual, NlpProcessor};
use crate::record_set::{RecordSet, View};
use crate::sentiment::{sentiment_report, SentimentReport};
use crate::stats::{fetch_stats, most_least_busy_users, perform_comparative_analysis, BusyUsers, MessageStats};
use crate::timeline::{
    activity_heatmap, daily_timeline, month_activity_map, monthly_timeline, user_activity_over_time,
    week_activity_map, Heatmap,
};
use crate::topics::{perform_lda_analysis, perform_tfidf_analysis, LdaParams, TermScore, Topic};

/// Entries of the analysis menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    UserStatistics,
    Sentiment,
    AdvancedNlp,
    Comparative,
    UserActivity,
    WordAndEmoji,
    Timeline,
}

impl AnalysisKind {
    /// Menu entries offered for a selection; comparison needs every user
    #[must_use]
    pub fn available_for(selection: &UserSelection) -> Vec<Self> {
        let all = [
            Self::UserStatistics,
            Self::Sentiment,
            Self::AdvancedNlp,
            Self::Comparative,
            Self::UserActivity,
            Self::WordAndEmoji,
            Self::Timeline,
        ];
        all.into_iter()
            .filter(|kind| selection.is_overall() || *kind != Self::Comparative)
            .collect()
    }

    /// Menu title
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::UserStatistics => "User Statistics",
            Self::Sentiment => "Sentiment Analysis",
            Self::AdvancedNlp => "Advanced NLP Analysis",
            Self::Comparative => "Comparative Analysis",
            Self::UserActivity => "User Activity",
            Self::WordAndEmoji => "Word and Emoji Analysis",
            Self::Timeline => "Timeline Analysis",
        }
    }

    const fn slug(&self) -> &'static str {
        match self {
            Self::UserStatistics => "stats",
            Self::Sentiment => "sentiment",
            Self::AdvancedNlp => "nlp",
            Self::Comparative => "compare",
            Self::UserActivity => "activity",
            Self::WordAndEmoji => "words",
            Self::Timeline => "timeline",
        }
    }
}

impl FromStr for AnalysisKind {
    type Err = ChatAnalyzerError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");
        match wanted.as_str() {
            "stats" | "user_statistics" => Ok(Self::UserStatistics),
            "sentiment" | "sentiment_analysis" => Ok(Self::Sentiment),
            "nlp" | "advanced_nlp" | "advanced_nlp_analysis" => Ok(Self::AdvancedNlp),
            "compare" | "comparative" | "comparative_analysis" => Ok(Self::Comparative),
            "activity" | "user_activity" => Ok(Self::UserActivity),
            "words" | "word_and_emoji" | "word_and_emoji_analysis" => Ok(Self::WordAndEmoji),
            "timeline" | "timeline_analysis" => Ok(Self::Timeline),
            _ => Err(ChatAnalyzerError::InvalidArgument(format!(
                "unknown analysis kind: {s} (expected stats, sentiment, nlp, compare, activity, words or timeline)"
            ))),
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Parameters of one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub kind: AnalysisKind,
    pub selection: UserSelection,
    pub range: DateRange,
    /// Users to compare; empty compares every participant
    pub compare_users: Vec<String>,
}

impl AnalysisRequest {
    /// Request for `kind` over every user and date
    #[must_use]
    pub const fn new(kind: AnalysisKind) -> Self {
        Self {
            kind,
            selection: UserSelection::Overall,
            range: DateRange::all(),
            compare_users: Vec::new(),
        }
    }
}

/// Data behind one dashboard view
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "analysis", rename_all = "snake_case")]
pub enum Report {
    UserStatistics {
        user: String,
        stats: MessageStats,
    },
    Sentiment {
        user: String,
        sentiment: SentimentReport,
    },
    AdvancedNlp {
        user: String,
        top_terms: Vec<TermScore>,
        topics: Vec<Topic>,
        language: Option<String>,
    },
    Comparative {
        range: DateRange,
        activity: Vec<CountBucket>,
    },
    UserActivity {
        user: String,
        busy_users: Option<BusyUsers>,
        activity_over_time: Option<Vec<CountBucket>>,
        week_activity: Vec<CountBucket>,
        month_activity: Vec<CountBucket>,
        heatmap: Heatmap,
    },
    WordAndEmoji {
        user: String,
        words: Vec<CountBucket>,
        emojis: Vec<CountBucket>,
    },
    Timeline {
        user: String,
        monthly: Vec<CountBucket>,
        daily: Vec<CountBucket>,
    },
}

/// Runs analyses over one record set
pub struct Analyzer<'a> {
    records: &'a RecordSet,
    nlp: NlpProcessor,
    settings: AnalysisConfig,
}

impl<'a> Analyzer<'a> {
    pub fn new(records: &'a RecordSet, settings: &AnalysisConfig) -> Result<Self> {
        let nlp = NlpProcessor::with_stopwords(&settings.extra_stopwords)?;
        Ok(Self {
            records,
            nlp,
            settings: settings.clone(),
        })
    }

    /// Shared text processor
    #[must_use]
    pub const fn nlp(&self) -> &NlpProcessor {
        &self.nlp
    }

    /// View for a selection and date range
    pub fn view(&self, selection: &UserSelection, range: &DateRange) -> Result<View<'a>> {
        Ok(self.records.select(selection)?.within(range))
    }

    /// Run one entry of the analysis menu
    #[instrument(skip(self), fields(kind = %request.kind, user = %request.selection))]
    pub fn run(&self, request: &AnalysisRequest) -> Result<Report> {
        if !AnalysisKind::available_for(&request.selection).contains(&request.kind) {
            return Err(ChatAnalyzerError::InvalidArgument(format!(
                "{} is only available for {}",
                request.kind.title(),
                UserSelection::Overall
            )));
        }

        let view = self.view(&request.selection, &request.range)?;
        let user = request.selection.to_string();
        debug!(rows = view.len(), "Running analysis");

        let report = match request.kind {
            AnalysisKind::UserStatistics => Report::UserStatistics {
                user,
                stats: fetch_stats(&view, &self.nlp),
            },
            AnalysisKind::Sentiment => Report::Sentiment {
                user,
                sentiment: sentiment_report(&view, &self.nlp, self.settings.sentiment_neutral_band),
            },
            AnalysisKind::AdvancedNlp => self.advanced_nlp(user, &view),
            AnalysisKind::Comparative => self.compare(&request.compare_users, &request.range)?,
            AnalysisKind::UserActivity => self.user_activity(user, &request.selection, &request.range, &view)?,
            AnalysisKind::WordAndEmoji => Report::WordAndEmoji {
                user,
                words: self.nlp.word_frequencies(&view, self.settings.top_words),
                emojis: self.nlp.emoji_frequencies(&view, self.settings.top_emojis),
            },
            AnalysisKind::Timeline => Report::Timeline {
                user,
                monthly: monthly_timeline(&view),
                daily: daily_timeline(&view),
            },
        };
        Ok(report)
    }

    /// Message counts of `users` (every participant when empty) in `range`
    pub fn compare(&self, users: &[String], range: &DateRange) -> Result<Report> {
        let users: Vec<String> = if users.is_empty() {
            self.records
                .users()
                .iter()
                .filter(|u| u.as_str() != GROUP_NOTIFICATION)
                .cloned()
                .collect()
        } else {
            users.to_vec()
        };
        Ok(Report::Comparative {
            range: *range,
            activity: perform_comparative_analysis(self.records, &users, range)?,
        })
    }

    fn advanced_nlp(&self, user: String, view: &View<'_>) -> Report {
        let documents: Vec<&str> = view.iter().filter(|m| is_textual(m)).map(|m| m.text.as_str()).collect();
        let params = LdaParams {
            topics: self.settings.lda_topics,
            words_per_topic: self.settings.lda_words_per_topic,
            iterations: self.settings.lda_iterations,
            seed: self.settings.lda_seed,
            ..LdaParams::default()
        };
        let sample: String = documents.iter().take(500).copied().collect::<Vec<_>>().join(" ");
        Report::AdvancedNlp {
            user,
            top_terms: perform_tfidf_analysis(&documents, &self.nlp, self.settings.tfidf_terms),
            topics: perform_lda_analysis(&documents, &self.nlp, &params),
            language: self.nlp.detect_language(&sample),
        }
    }

    fn user_activity(
        &self,
        user: String,
        selection: &UserSelection,
        range: &DateRange,
        view: &View<'_>,
    ) -> Result<Report> {
        let (busy_users, activity_over_time) = match selection {
            UserSelection::Overall => (Some(most_least_busy_users(view, self.settings.top_users)), None),
            UserSelection::User(name) => (None, Some(user_activity_over_time(self.records, name, range)?)),
        };
        Ok(Report::UserActivity {
            user,
            busy_users,
            activity_over_time,
            week_activity: week_activity_map(view),
            month_activity: month_activity_map(view),
            heatmap: activity_heatmap(view),
        })
    }
}

fn write_series(f: &mut fmt::Formatter<'_>, title: &str, buckets: &[CountBucket]) -> fmt::Result {
    writeln!(f, "{title}")?;
    if buckets.is_empty() {
        return writeln!(f, "  (no data)");
    }
    let max = buckets.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    let width = buckets.iter().map(|b| b.label.chars().count()).max().unwrap_or(0);
    for bucket in buckets {
        let bar = "#".repeat((bucket.count * 40).div_ceil(max));
        writeln!(f, "  {:<width$}  {:>6}  {bar}", bucket.label, bucket.count)?;
    }
    Ok(())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserStatistics { user, stats } => {
                writeln!(f, "User Statistics ({user})")?;
                for (label, value) in [
                    ("Total Messages Shared", stats.total_messages),
                    ("Total Words Shared", stats.total_words),
                    ("Total Media Shared", stats.media_messages),
                    ("Total Links Shared", stats.links_shared),
                    ("Total Emoji Shared", stats.emojis_shared),
                    ("Total Deleted Messages", stats.deleted_messages),
                    ("Total Edited Messages", stats.edited_messages),
                    ("Total Contacts Shared", stats.contacts_shared),
                    ("Total Locations Shared", stats.locations_shared),
                ] {
                    writeln!(f, "  {label:<24} {value}")?;
                }
                Ok(())
            }
            Self::Sentiment { user, sentiment } => {
                writeln!(f, "Sentiment Analysis ({user})")?;
                write_series(f, "Sentiment Distribution", &sentiment.distribution)?;
                writeln!(
                    f,
                    "Mean score {:.3} over {} messages",
                    sentiment.mean_score, sentiment.scored_messages
                )?;
                writeln!(f, "Sentiment Trends Over Time")?;
                for point in &sentiment.trend {
                    writeln!(f, "  {}  {:<8}  {}", point.date, point.sentiment, point.count)?;
                }
                Ok(())
            }
            Self::AdvancedNlp {
                user,
                top_terms,
                topics,
                language,
            } => {
                writeln!(f, "Advanced NLP Analysis ({user})")?;
                if let Some(language) = language {
                    writeln!(f, "Detected language: {language}")?;
                }
                writeln!(f, "TF-IDF top terms")?;
                for term in top_terms {
                    writeln!(f, "  {:<20} {:.4}", term.term, term.score)?;
                }
                writeln!(f, "LDA topics")?;
                for topic in topics {
                    writeln!(f, "  {topic}")?;
                }
                Ok(())
            }
            Self::Comparative { activity, .. } => write_series(f, "Comparative Analysis between Users", activity),
            Self::UserActivity {
                user,
                busy_users,
                activity_over_time,
                week_activity,
                month_activity,
                heatmap,
            } => {
                writeln!(f, "User Activity ({user})")?;
                if let Some(busy) = busy_users {
                    let to_buckets = |shares: &[crate::stats::UserShare]| -> Vec<CountBucket> {
                        shares
                            .iter()
                            .map(|s| CountBucket::new(format!("{} ({:.2}%)", s.user, s.percent), s.count))
                            .collect()
                    };
                    write_series(f, "Most Active Users", &to_buckets(&busy.most_active))?;
                    write_series(f, "Least Active Users", &to_buckets(&busy.least_active))?;
                }
                if let Some(activity) = activity_over_time {
                    write_series(f, "User Activity Over Time", activity)?;
                }
                write_series(f, "Week Activity Map", week_activity)?;
                write_series(f, "Month Activity Map", month_activity)?;
                writeln!(f, "Activity Heatmap (rows: day, columns: hour)")?;
                write!(f, "  {:<10}", "")?;
                for hour in 0..heatmap.periods.len() {
                    write!(f, "{hour:>4}")?;
                }
                writeln!(f)?;
                for (day, row) in heatmap.days.iter().zip(&heatmap.cells) {
                    write!(f, "  {day:<10}")?;
                    for cell in row {
                        write!(f, "{cell:>4}")?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            }
            Self::WordAndEmoji { user, words, emojis } => {
                writeln!(f, "Word and Emoji Analysis ({user})")?;
                write_series(f, "Most Common Words", words)?;
                write_series(f, "Emoji Analysis", emojis)
            }
            Self::Timeline { user, monthly, daily } => {
                writeln!(f, "Timeline Analysis ({user})")?;
                write_series(f, "Monthly Timeline", monthly)?;
                write_series(f, "Daily Timeline", daily)
            }
        }
    }
}
