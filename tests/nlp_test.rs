use chat_analyzer::models::SentimentLabel;
use chat_analyzer::nlp::NlpProcessor;

#[test]
fn test_nlp_processor_creation() {
    let processor = NlpProcessor::new().expect("Failed to create NLP processor");
    assert!(processor.is_stopword("the"));
    assert!(!processor.is_stopword("guitar"));
}

#[test]
fn test_extra_stopwords() {
    let processor =
        NlpProcessor::with_stopwords(&["Omitted".to_string()]).expect("Failed to create NLP processor");
    assert!(processor.is_stopword("omitted"));
    assert!(processor.content_words("image omitted").iter().all(|w| w != "omitted"));
}

#[test]
fn test_text_cleaning() {
    let processor = NlpProcessor::new().expect("Failed to create NLP processor");

    // URL removal
    let cleaned = processor.clean_text("Check out https://example.com for more info");
    assert!(!cleaned.contains("https://"));
    assert!(cleaned.contains("check"));

    // Emoji removal
    let cleaned = processor.clean_text("Hello 😀 world 🌍");
    assert!(!cleaned.contains('😀'));
    assert!(!cleaned.contains('🌍'));
    assert_eq!(cleaned, "hello world");

    // Punctuation removal
    let cleaned = processor.clean_text("Hello!!! How are you???");
    assert!(!cleaned.contains("!!!"));
    assert!(!cleaned.contains("???"));

    // Apostrophes are joined, not split
    assert_eq!(processor.clean_text("Don't"), "dont");
}

#[test]
fn test_tokenization() {
    let processor = NlpProcessor::new().expect("Failed to create NLP processor");

    let tokens = processor.content_words("The pizza and the guitar! 42 a");
    assert!(tokens.contains(&"pizza".to_string()));
    assert!(tokens.contains(&"guitar".to_string()));
    assert!(!tokens.contains(&"the".to_string()));
    assert!(!tokens.contains(&"42".to_string()));
    assert!(!tokens.contains(&"a".to_string()));
}

#[test]
fn test_stemming() {
    let processor = NlpProcessor::new().expect("Failed to create NLP processor");
    assert_eq!(processor.stem("running"), processor.stem("runs"));
}

#[test]
fn test_sentiment_analysis() {
    let processor = NlpProcessor::new().expect("Failed to create NLP processor");

    let positive_score = processor.analyze_sentiment("This is great and amazing!");
    assert!(positive_score > 0.0);

    let negative_score = processor.analyze_sentiment("This is terrible and awful!");
    assert!(negative_score < 0.0);

    let neutral_score = processor.analyze_sentiment("The sky is blue and the grass is green");
    assert!(neutral_score.abs() < f32::EPSILON);
}

#[test]
fn test_sentiment_negation_and_intensifiers() {
    let processor = NlpProcessor::new().expect("Failed to create NLP processor");

    assert!(processor.analyze_sentiment("not good") < 0.0);
    assert!(processor.analyze_sentiment("somewhat good") < processor.analyze_sentiment("good"));

    let score = processor.analyze_sentiment("extremely amazing fantastic excellent");
    assert!((-1.0..=1.0).contains(&score));
}

#[test]
fn test_classify_sentiment() {
    assert_eq!(NlpProcessor::classify_sentiment(0.5, 0.05), SentimentLabel::Positive);
    assert_eq!(NlpProcessor::classify_sentiment(-0.5, 0.05), SentimentLabel::Negative);
    assert_eq!(NlpProcessor::classify_sentiment(0.03, 0.05), SentimentLabel::Neutral);
    assert_eq!(NlpProcessor::classify_sentiment(0.0, 0.0), SentimentLabel::Neutral);
}

#[test]
fn test_extract_emojis_and_urls() {
    let processor = NlpProcessor::new().expect("Failed to create NLP processor");

    assert_eq!(processor.extract_emojis("ok 😀😀 fine 🎉"), vec!["😀", "😀", "🎉"]);
    assert!(processor.extract_emojis("no emoji here").is_empty());
    assert_eq!(processor.count_urls("see https://a.example and www.b.example"), 2);
}

#[test]
fn test_emoji_sequences_count_once() {
    let processor = NlpProcessor::new().expect("Failed to create NLP processor");

    let emojis = processor.extract_emojis("go team 🇮🇳 👨\u{200d}👩\u{200d}👧 👍🏽 © 2024 ®");
    assert_eq!(emojis, vec!["🇮🇳", "👨\u{200d}👩\u{200d}👧", "👍🏽"]);
    assert_eq!(processor.clean_text("go 🇮🇳 team"), "go team");
}

#[test]
fn test_language_detection() {
    let processor = NlpProcessor::new().expect("Failed to create NLP processor");
    let language = processor.detect_language(
        "This is a fairly long English sentence, written so that language detection has enough text to be confident.",
    );
    assert_eq!(language.as_deref(), Some("eng"));
}
