use std::fs;

use chat_analyzer::cache::{load_chat, ChatCache};
use chat_analyzer::config::ParserConfig;
use chat_analyzer::file_writer::write_messages_to_file;
use chat_analyzer::models::{ChatMessage, OutputFormat, UserSelection};
use chat_analyzer::parser::{ChatParser, DateOrder};
use tempfile::tempdir;

const ANDROID_CHAT: &str = include_str!("fixtures/android_chat.txt");

fn parser() -> ChatParser {
    ChatParser::new(&ParserConfig {
        date_order: DateOrder::Auto,
    })
    .expect("Failed to compile parser")
}

#[test]
fn test_export_csv_has_header_and_one_row_per_message() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("nested").join("chat.csv");

    let chat = load_chat(ANDROID_CHAT.as_bytes(), &parser(), None).expect("Failed to load chat");
    let bytes = write_messages_to_file(chat.records.messages(), OutputFormat::Csv, &output)
        .expect("Failed to export");
    assert_eq!(bytes, fs::metadata(&output).expect("Output exists").len());

    let mut reader = csv::Reader::from_path(&output).expect("Failed to open CSV");
    let headers = reader.headers().expect("Header row").clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["ID", "Sender", "Datetime", "Message", "Flags"]);

    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().expect("Valid rows");
    assert_eq!(rows.len(), 7);
    assert_eq!(&rows[0][0], "1");
    assert_eq!(&rows[0][2], "2024-01-12 09:15:00");
    assert_eq!(&rows[2][4], "media");

    let continued = rows.iter().find(|r| &r[1] == "Carol").expect("Carol row");
    assert!(continued[3].contains('\n'));
}

#[test]
fn test_export_txt_for_single_user() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("bob.txt");

    let chat = load_chat(ANDROID_CHAT.as_bytes(), &parser(), None).expect("Failed to load chat");
    let view = chat
        .records
        .select(&UserSelection::User("Bob".to_string()))
        .expect("Bob is a participant");
    write_messages_to_file(view.iter(), OutputFormat::Txt, &output).expect("Failed to export");

    let content = fs::read_to_string(&output).expect("Failed to read export");
    assert!(content.starts_with("Bob, 2024-01-12 09:16:00, morning, this pizza is amazing"));
    assert!(!content.contains("Alice"));
    assert_eq!(content.matches("Bob, ").count(), 2);
}

#[test]
fn test_export_json_round_trips_records() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output = temp_dir.path().join("chat.json");

    let chat = load_chat(ANDROID_CHAT.as_bytes(), &parser(), None).expect("Failed to load chat");
    write_messages_to_file(chat.records.messages(), OutputFormat::Json, &output).expect("Failed to export");

    let parsed: Vec<ChatMessage> =
        serde_json::from_str(&fs::read_to_string(&output).expect("Failed to read export")).expect("Valid JSON");
    assert_eq!(parsed.as_slice(), chat.records.messages());
}

#[test]
fn test_cached_chat_matches_fresh_parse() {
    let cache_dir = tempdir().expect("Failed to create temp directory");
    let cache = ChatCache::open(cache_dir.path()).expect("Failed to open cache");
    let parser = parser();

    let fresh = load_chat(ANDROID_CHAT.as_bytes(), &parser, None).expect("Failed to load chat");
    let stored = load_chat(ANDROID_CHAT.as_bytes(), &parser, Some(&cache)).expect("Failed to load chat");
    let cached = load_chat(ANDROID_CHAT.as_bytes(), &parser, Some(&cache)).expect("Failed to load chat");

    assert!(!stored.from_cache);
    assert!(cached.from_cache);
    assert_eq!(cached.records.messages(), fresh.records.messages());
    assert_eq!(cached.records.users(), fresh.records.users());
    assert_eq!(cached.skipped_lines, fresh.skipped_lines);
}

#[test]
fn test_output_format_parsing() {
    assert_eq!("CSV".parse::<OutputFormat>().expect("known format"), OutputFormat::Csv);
    assert_eq!("txt".parse::<OutputFormat>().expect("known format"), OutputFormat::Txt);
    assert_eq!("json".parse::<OutputFormat>().expect("known format"), OutputFormat::Json);
    assert!("xlsx".parse::<OutputFormat>().is_err());
    assert_eq!(OutputFormat::Csv.extension(), "csv");
}
