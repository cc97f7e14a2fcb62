//! Chat Analyzer - WhatsApp Chat Export Analysis
//!
//! A Rust library for parsing WhatsApp chat exports and turning them into
//! the aggregates behind a chat-analysis dashboard.
//!
//! # Features
//!
//! - Parse Android and iOS exports (12/24-hour clocks, day- or month-first dates)
//! - Per-user statistics, activity maps and timelines
//! - Word, emoji and sentiment analysis
//! - TF-IDF terms and LDA topics
//! - Disk-backed memoization of parsed exports
//! - Export of the parsed record set to TXT, CSV or JSON

/// Analysis menu and reports
pub mod analysis;
/// Parsed-export cache
pub mod cache;
/// Configuration management
pub mod config;
/// Library error type
pub mod error;
/// Record-set export
pub mod file_writer;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// NLP processing
pub mod nlp;
/// Chat export parsing
pub mod parser;
/// Parsed messages and filtered views
pub mod record_set;
/// Sentiment distribution and trends
pub mod sentiment;
/// Message counts and user rankings
pub mod stats;
/// Time-bucketed aggregation
pub mod timeline;
/// TF-IDF and topic modelling
pub mod topics;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use analysis::{AnalysisKind, AnalysisRequest, Analyzer, Report};
pub use cache::{load_chat, ChatCache, LoadedChat};
pub use error::{ChatAnalyzerError, Result};
pub use models::{ChatMessage, DateRange, MessageFlags, OutputFormat, UserSelection};
pub use nlp::NlpProcessor;
pub use parser::{ChatParser, DateOrder};
pub use record_set::{RecordSet, View};
