//! Integration tests for the analysis menu and the aggregations behind it

use chat_analyzer::analysis::{AnalysisKind, AnalysisRequest, Analyzer, Report};
use chat_analyzer::config::{AnalysisConfig, AppConfig, ParserConfig};
use chat_analyzer::error::ChatAnalyzerError;
use chat_analyzer::models::{total_count, DateRange, UserSelection, OVERALL_USERS};
use chat_analyzer::nlp::NlpProcessor;
use chat_analyzer::parser::{ChatParser, DateOrder};
use chat_analyzer::record_set::RecordSet;
use chat_analyzer::stats::{count_by_user, fetch_stats, most_least_busy_users};
use chat_analyzer::timeline::{
    activity_heatmap, daily_timeline, month_activity_map, monthly_timeline, week_activity_map,
};
use chat_analyzer::topics::{perform_lda_analysis, LdaParams};
use chrono::NaiveDate;
use proptest::prelude::*;

const ANDROID_CHAT: &str = include_str!("fixtures/android_chat.txt");

fn records_from(raw: &str) -> RecordSet {
    let parser = ChatParser::new(&ParserConfig {
        date_order: DateOrder::DayFirst,
    })
    .expect("Failed to compile parser");
    RecordSet::new(parser.parse(raw).expect("Failed to parse").messages)
}

fn settings() -> AnalysisConfig {
    AppConfig::default().analysis
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn test_user_options_lists_overall_first() {
    let records = records_from(ANDROID_CHAT);
    let options = records.user_options("");
    assert_eq!(options[0], OVERALL_USERS);
    assert!(options.contains(&"Alice".to_string()));
    assert!(options.contains(&"Carol".to_string()));

    assert_eq!(records.user_options("BO"), vec!["Bob".to_string()]);
}

#[test]
fn test_fetch_stats_overall() {
    let records = records_from(ANDROID_CHAT);
    let nlp = NlpProcessor::new().expect("Failed to create NLP processor");
    let stats = fetch_stats(&records.view(), &nlp);

    assert_eq!(stats.total_messages, 7);
    assert_eq!(stats.total_words, 27);
    assert_eq!(stats.media_messages, 1);
    assert_eq!(stats.links_shared, 1);
    assert_eq!(stats.emojis_shared, 2);
    assert_eq!(stats.deleted_messages, 1);
    assert_eq!(stats.edited_messages, 0);
}

#[test]
fn test_busy_users_exclude_notifications() {
    let records = records_from(ANDROID_CHAT);
    let busy = most_least_busy_users(&records.view(), 2);

    assert_eq!(busy.most_active.len(), 2);
    assert_eq!(busy.most_active[0].user, "Alice");
    assert_eq!(busy.most_active[0].count, 3);
    assert!((busy.most_active[0].percent - 50.0).abs() < f64::EPSILON);
    assert_eq!(busy.least_active[0].user, "Carol");
    assert!(busy
        .most_active
        .iter()
        .chain(&busy.least_active)
        .all(|share| share.user != chat_analyzer::models::GROUP_NOTIFICATION));
}

#[test]
fn test_unknown_user_is_an_error() {
    let records = records_from(ANDROID_CHAT);
    let err = records.select(&UserSelection::User("Mallory".to_string())).unwrap_err();
    assert!(matches!(err, ChatAnalyzerError::UnknownUser(name) if name == "Mallory"));
}

#[test]
fn test_timelines_are_chronological() {
    let records = records_from(ANDROID_CHAT);
    let view = records.view();

    let monthly = monthly_timeline(&view);
    let labels: Vec<&str> = monthly.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["January-2024", "February-2024"]);
    assert_eq!(monthly[0].count, 5);

    let daily = daily_timeline(&view);
    assert_eq!(daily.first().map(|b| b.label.as_str()), Some("2024-01-12"));
    assert_eq!(daily.len(), 3);
}

#[test]
fn test_comparison_is_hidden_for_single_user() {
    let single = AnalysisKind::available_for(&UserSelection::User("Alice".to_string()));
    assert!(!single.contains(&AnalysisKind::Comparative));
    assert_eq!(single.len(), 6);
    assert!(AnalysisKind::available_for(&UserSelection::Overall).contains(&AnalysisKind::Comparative));

    let records = records_from(ANDROID_CHAT);
    let analyzer = Analyzer::new(&records, &settings()).expect("Failed to create analyzer");
    let request = AnalysisRequest {
        selection: UserSelection::User("Alice".to_string()),
        ..AnalysisRequest::new(AnalysisKind::Comparative)
    };
    assert!(matches!(analyzer.run(&request), Err(ChatAnalyzerError::InvalidArgument(_))));
}

#[test]
fn test_comparative_analysis_respects_range() {
    let records = records_from(ANDROID_CHAT);
    let analyzer = Analyzer::new(&records, &settings()).expect("Failed to create analyzer");
    let report = analyzer
        .compare(
            &["Alice".to_string(), "Bob".to_string()],
            &DateRange::between(date(2024, 1, 1), date(2024, 1, 31)),
        )
        .expect("Failed to compare");

    let Report::Comparative { activity, .. } = report else {
        panic!("expected a comparative report");
    };
    assert_eq!(activity[0].label, "Alice");
    assert_eq!(activity[0].count, 2);
    assert_eq!(activity[1].label, "Bob");
    assert_eq!(activity[1].count, 2);
}

#[test]
fn test_user_activity_for_single_user() {
    let records = records_from(ANDROID_CHAT);
    let analyzer = Analyzer::new(&records, &settings()).expect("Failed to create analyzer");
    let request = AnalysisRequest {
        selection: UserSelection::User("Bob".to_string()),
        ..AnalysisRequest::new(AnalysisKind::UserActivity)
    };

    let Report::UserActivity {
        busy_users,
        activity_over_time,
        week_activity,
        heatmap,
        ..
    } = analyzer.run(&request).expect("Failed to run analysis")
    else {
        panic!("expected a user activity report");
    };
    assert!(busy_users.is_none());
    assert_eq!(activity_over_time.map(|a| total_count(&a)), Some(2));
    assert_eq!(total_count(&week_activity), 2);
    assert_eq!(heatmap.total(), 2);
}

#[test]
fn test_every_kind_renders_and_serializes() {
    let records = records_from(ANDROID_CHAT);
    let analyzer = Analyzer::new(&records, &settings()).expect("Failed to create analyzer");

    for kind in AnalysisKind::available_for(&UserSelection::Overall) {
        let report = analyzer
            .run(&AnalysisRequest::new(kind))
            .expect("Failed to run analysis");
        assert!(!report.to_string().is_empty());

        let json = serde_json::to_value(&report).expect("Failed to serialize report");
        let tag = serde_json::to_value(kind).expect("Failed to serialize kind");
        assert_eq!(json["analysis"], tag);
    }
}

#[test]
fn test_word_and_emoji_report_skips_media_and_stopwords() {
    let records = records_from(ANDROID_CHAT);
    let analyzer = Analyzer::new(&records, &settings()).expect("Failed to create analyzer");
    let Report::WordAndEmoji { words, emojis, .. } = analyzer
        .run(&AnalysisRequest::new(AnalysisKind::WordAndEmoji))
        .expect("Failed to run analysis")
    else {
        panic!("expected a word and emoji report");
    };

    assert!(words.iter().all(|b| b.label != "omitted" && b.label != "media"));
    assert!(words.iter().all(|b| b.label != "this" && b.label != "is"));
    assert!(words.iter().any(|b| b.label == "pizza"));
    assert_eq!(total_count(&emojis), 2);
}

#[test]
fn test_lda_is_deterministic() {
    let records = records_from(ANDROID_CHAT);
    let nlp = NlpProcessor::new().expect("Failed to create NLP processor");
    let documents = records.view().user_texts();
    let params = LdaParams {
        topics: 2,
        words_per_topic: 3,
        iterations: 50,
        ..LdaParams::default()
    };

    let first = perform_lda_analysis(&documents, &nlp, &params);
    let second = perform_lda_analysis(&documents, &nlp, &params);
    assert_eq!(first, second);
    assert!(first.len() <= 2);
    assert!(first.iter().all(|t| t.terms.len() <= 3));
}

fn chat_line() -> impl Strategy<Value = String> {
    (
        1u32..=28,
        1u32..=12,
        2019i32..=2024,
        0u32..24,
        prop::sample::select(vec!["Alice", "Bob", "Carol"]),
        "[a-z]{1,8}( [a-z]{1,8}){0,3}",
    )
        .prop_map(|(day, month, year, hour, sender, text)| {
            format!("{day:02}/{month:02}/{year}, {hour:02}:30 - {sender}: {text}")
        })
}

proptest! {
    #[test]
    fn prop_aggregations_sum_to_total(lines in prop::collection::vec(chat_line(), 1..60)) {
        let records = records_from(&lines.join("\n"));
        let view = records.view();
        let total = view.len();

        prop_assert_eq!(total_count(&count_by_user(&view)), total);
        prop_assert_eq!(total_count(&daily_timeline(&view)), total);
        prop_assert_eq!(total_count(&monthly_timeline(&view)), total);
        prop_assert_eq!(total_count(&week_activity_map(&view)), total);
        prop_assert_eq!(total_count(&month_activity_map(&view)), total);
        prop_assert_eq!(activity_heatmap(&view).total(), total);
    }

    #[test]
    fn prop_user_filter_yields_only_that_user(
        lines in prop::collection::vec(chat_line(), 1..60),
        user in prop::sample::select(vec!["Alice", "Bob", "Carol"]),
    ) {
        let records = records_from(&lines.join("\n"));
        let selection = UserSelection::User(user.to_string());
        match records.select(&selection) {
            Ok(view) => {
                prop_assert!(view.iter().all(|m| m.sender == user));
                let expected = records.messages().iter().filter(|m| m.sender == user).count();
                prop_assert_eq!(view.len(), expected);
            }
            Err(ChatAnalyzerError::UnknownUser(_)) => prop_assert!(!records.has_user(user)),
            Err(e) => return Err(TestCaseError::fail(e.to_string())),
        }
    }

    #[test]
    fn prop_date_range_keeps_rows_inside(
        lines in prop::collection::vec(chat_line(), 1..60),
        start_offset in 0i64..2000,
        length in 0i64..800,
    ) {
        let records = records_from(&lines.join("\n"));
        let start = date(2019, 1, 1) + chrono::Duration::days(start_offset);
        let end = start + chrono::Duration::days(length);
        let range = DateRange::between(start, end);

        let view = records.view().within(&range);
        prop_assert!(view.iter().all(|m| m.date() >= start && m.date() <= end));
        let expected = records.messages().iter().filter(|m| range.contains(m.date())).count();
        prop_assert_eq!(view.len(), expected);
    }
}
