use anyhow::Result;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{HashMap, HashSet};
use stop_words::{get, LANGUAGE};
use unicode_normalization::UnicodeNormalization;
use whatlang::detect;

use crate::models::{ChatMessage, CountBucket, SentimentLabel};
use crate::record_set::View;

const POSITIVE_WORDS: [(&str, f32); 40] = [
    ("good", 1.0),
    ("great", 1.5),
    ("excellent", 2.0),
    ("amazing", 2.0),
    ("wonderful", 1.8),
    ("fantastic", 1.8),
    ("happy", 1.2),
    ("joy", 1.5),
    ("love", 2.0),
    ("like", 1.0),
    ("best", 1.5),
    ("better", 1.2),
    ("awesome", 1.8),
    ("perfect", 2.0),
    ("brilliant", 1.8),
    ("outstanding", 1.8),
    ("superb", 1.8),
    ("delightful", 1.5),
    ("pleased", 1.2),
    ("satisfied", 1.0),
    ("excited", 1.5),
    ("thrilled", 1.8),
    ("grateful", 1.5),
    ("lucky", 1.0),
    ("successful", 1.5),
    ("win", 1.5),
    ("congrats", 1.8),
    ("congratulations", 1.8),
    ("thanks", 1.2),
    ("thank", 1.2),
    ("nice", 1.0),
    ("cool", 0.8),
    ("fun", 1.2),
    ("beautiful", 1.5),
    ("glad", 1.2),
    ("haha", 1.0),
    ("hahaha", 1.2),
    ("lol", 0.8),
    ("yay", 1.5),
    ("cute", 1.0),
];

const NEGATIVE_WORDS: [(&str, f32); 36] = [
    ("bad", -1.0),
    ("terrible", -2.0),
    ("awful", -2.0),
    ("horrible", -2.0),
    ("worst", -2.0),
    ("hate", -2.0),
    ("dislike", -1.0),
    ("poor", -1.2),
    ("disappointing", -1.5),
    ("disappointed", -1.5),
    ("sad", -1.2),
    ("angry", -1.5),
    ("upset", -1.2),
    ("frustrated", -1.5),
    ("annoyed", -1.2),
    ("annoying", -1.2),
    ("irritated", -1.2),
    ("disgusted", -1.8),
    ("furious", -2.0),
    ("devastated", -2.0),
    ("depressed", -1.8),
    ("miserable", -1.8),
    ("hopeless", -1.8),
    ("worried", -1.2),
    ("anxious", -1.2),
    ("scared", -1.5),
    ("afraid", -1.2),
    ("disgusting", -1.8),
    ("pathetic", -1.5),
    ("useless", -1.5),
    ("sorry", -0.6),
    ("sick", -1.0),
    ("tired", -0.8),
    ("boring", -1.0),
    ("wrong", -1.0),
    ("problem", -0.8),
];

const INTENSIFIERS: [(&str, f32); 14] = [
    ("very", 1.5),
    ("extremely", 2.0),
    ("incredibly", 2.0),
    ("absolutely", 2.0),
    ("completely", 1.8),
    ("totally", 1.8),
    ("really", 1.3),
    ("so", 1.2),
    ("quite", 1.2),
    ("rather", 1.1),
    ("somewhat", 0.8),
    ("slightly", 0.7),
    ("barely", 0.5),
    ("hardly", 0.5),
];

const NEGATIONS: [&str; 17] = [
    "not", "no", "never", "none", "nothing", "nobody", "nowhere", "neither", "nor", "dont",
    "doesnt", "didnt", "isnt", "wasnt", "cant", "wont", "aint",
];

/// One whole emoji: a flag pair, a keycap, or a pictograph with its
/// variation selector, skin tone and ZWJ-joined parts. Text-presentation
/// symbols such as `©` only count when followed by U+FE0F.
const EMOJI_PATTERN: &str = concat!(
    r"\p{Regional_Indicator}\p{Regional_Indicator}",
    r"|[0-9#*]\x{FE0F}?\x{20E3}",
    r"|(?:\p{Emoji_Presentation}\x{FE0F}?|\p{Extended_Pictographic}\x{FE0F})\p{Emoji_Modifier}?",
    r"(?:\x{200D}(?:\p{Emoji_Presentation}|\p{Extended_Pictographic})\x{FE0F}?\p{Emoji_Modifier}?)*",
);

/// NLP processor for chat text
pub struct NlpProcessor {
    url_regex: Regex,
    emoji_regex: Regex,
    apostrophe_regex: Regex,
    special_chars_regex: Regex,
    extra_spaces_regex: Regex,
    stopwords: HashSet<String>,
    stemmer: Stemmer,
}

impl NlpProcessor {
    /// Create a processor with the English stop word list
    pub fn new() -> Result<Self> {
        Self::with_stopwords(&[])
    }

    /// Create a processor that also ignores `extra` words
    pub fn with_stopwords(extra: &[String]) -> Result<Self> {
        let url_regex = Regex::new(r"(?i)https?://\S+|www\.\S+")
            .map_err(|e| anyhow::anyhow!("Failed to compile URL regex: {e}"))?;
        let emoji_regex = Regex::new(EMOJI_PATTERN)
            .map_err(|e| anyhow::anyhow!("Failed to compile emoji regex: {e}"))?;
        let apostrophe_regex = Regex::new(r"['’]")
            .map_err(|e| anyhow::anyhow!("Failed to compile apostrophe regex: {e}"))?;
        let special_chars_regex = Regex::new(r"[^\w\s]|_")
            .map_err(|e| anyhow::anyhow!("Failed to compile special chars regex: {e}"))?;
        let extra_spaces_regex = Regex::new(r"\s+")
            .map_err(|e| anyhow::anyhow!("Failed to compile spaces regex: {e}"))?;

        let stopwords: HashSet<String> = get(LANGUAGE::English)
            .iter()
            .map(ToString::to_string)
            .chain(extra.iter().map(|w| w.to_lowercase()))
            .collect();

        Ok(Self {
            url_regex,
            emoji_regex,
            apostrophe_regex,
            special_chars_regex,
            extra_spaces_regex,
            stopwords,
            stemmer: Stemmer::create(Algorithm::English),
        })
    }

    /// Clean the text by removing URLs, emojis and punctuation, then lowercase
    #[must_use]
    pub fn clean_text(&self, text: &str) -> String {
        let normalized = text.nfc().collect::<String>();
        let no_urls = self.url_regex.replace_all(&normalized, " ");
        let no_emojis = self.emoji_regex.replace_all(&no_urls, " ");
        let no_apostrophes = self.apostrophe_regex.replace_all(&no_emojis, "");
        let no_special = self.special_chars_regex.replace_all(&no_apostrophes, " ");
        let normalized_spaces = self.extra_spaces_regex.replace_all(&no_special, " ");
        normalized_spaces.trim().to_lowercase()
    }

    /// Split cleaned text into content words (stop words, numbers and
    /// single characters dropped)
    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace()
            .filter(|s| s.chars().count() > 1)
            .filter(|s| !s.chars().all(|c| c.is_numeric()))
            .filter(|s| !self.stopwords.contains(*s))
            .map(ToString::to_string)
            .collect()
    }

    /// Clean and tokenize in one step
    #[must_use]
    pub fn content_words(&self, text: &str) -> Vec<String> {
        self.tokenize(&self.clean_text(text))
    }

    /// English stem of a token
    #[must_use]
    pub fn stem(&self, token: &str) -> String {
        self.stemmer.stem(token).into_owned()
    }

    /// Whether `word` is ignored by tokenization
    #[must_use]
    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    /// Sentiment score in `[-1, 1]` from a weighted lexicon
    ///
    /// An intensifier directly before a sentiment word scales it; a negation
    /// in the two preceding words flips it at reduced strength.
    #[must_use]
    pub fn analyze_sentiment(&self, text: &str) -> f32 {
        let cleaned = self.clean_text(text);
        let words: Vec<&str> = cleaned.split_whitespace().collect();
        let mut total_sentiment = 0.0_f32;
        let mut word_count = 0.0_f32;

        for (i, word) in words.iter().enumerate() {
            let Some(mut sentiment) = POSITIVE_WORDS
                .iter()
                .chain(NEGATIVE_WORDS.iter())
                .find(|(w, _)| w == word)
                .map(|(_, weight)| *weight)
            else {
                continue;
            };

            if i > 0 {
                if let Some((_, intensity)) = INTENSIFIERS.iter().find(|(w, _)| *w == words[i - 1]) {
                    sentiment *= intensity;
                }
            }

            let has_negation = (i >= 1 && NEGATIONS.contains(&words[i - 1]))
                || (i >= 2 && NEGATIONS.contains(&words[i - 2]));
            if has_negation {
                sentiment = -sentiment * 0.8;
            }

            total_sentiment += sentiment;
            word_count += 1.0;
        }

        if word_count == 0.0 {
            0.0
        } else {
            (total_sentiment / word_count).clamp(-1.0, 1.0)
        }
    }

    /// Map a score to a label; scores within `neutral_band` of zero are neutral
    #[must_use]
    pub fn classify_sentiment(score: f32, neutral_band: f32) -> SentimentLabel {
        if score > neutral_band {
            SentimentLabel::Positive
        } else if score < -neutral_band {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    /// Number of links in `text`
    #[must_use]
    pub fn count_urls(&self, text: &str) -> usize {
        self.url_regex.find_iter(text).count()
    }

    /// Emojis in `text`, in order of appearance
    #[must_use]
    pub fn extract_emojis(&self, text: &str) -> Vec<String> {
        self.emoji_regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// ISO 639-3 code of the detected language, if confident enough
    #[must_use]
    pub fn detect_language(&self, text: &str) -> Option<String> {
        detect(text)
            .filter(|info| info.is_reliable())
            .map(|info| info.lang().code().to_string())
    }

    /// Most frequent content words of a view, the data behind a word cloud
    ///
    /// Notifications, media placeholders and deleted messages are ignored.
    #[must_use]
    pub fn word_frequencies(&self, view: &View<'_>, top_n: usize) -> Vec<CountBucket> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for message in view.iter().filter(|m| is_textual(m)) {
            for word in self.content_words(&message.text) {
                *counts.entry(word).or_insert(0) += 1;
            }
        }
        top_buckets(counts, top_n)
    }

    /// Emoji usage of a view, most used first
    #[must_use]
    pub fn emoji_frequencies(&self, view: &View<'_>, top_n: usize) -> Vec<CountBucket> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for message in view.iter().filter(|m| m.is_user_message()) {
            for emoji in self.extract_emojis(&message.text) {
                *counts.entry(emoji).or_insert(0) += 1;
            }
        }
        top_buckets(counts, top_n)
    }
}

/// Whether a message carries text worth analyzing
#[must_use]
pub fn is_textual(message: &ChatMessage) -> bool {
    message.is_user_message() && !message.flags.media && !message.flags.deleted
}

/// Sort by count (descending) then label, keep `top_n`
fn top_buckets(counts: HashMap<String, usize>, top_n: usize) -> Vec<CountBucket> {
    let mut buckets: Vec<CountBucket> = counts
        .into_iter()
        .map(|(label, count)| CountBucket { label, count })
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    buckets.truncate(top_n);
    buckets
}
