//! File writing utilities for record-set export.
//!
//! Writes parsed messages as TXT, CSV or JSON so the record set can be
//! inspected or loaded into other tools.

use crate::error::Result;
use crate::models::{ChatMessage, OutputFormat};
use csv::Writer;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write messages to a file in the specified format.
///
/// Parent directories are created as needed. Returns the size of the
/// written file in bytes.
pub fn write_messages_to_file<'a>(
    messages: impl IntoIterator<Item = &'a ChatMessage>,
    format: OutputFormat,
    file_path: &Path,
) -> Result<u64> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }

    match format {
        OutputFormat::Txt => write_txt_file(messages, file_path)?,
        OutputFormat::Csv => write_csv_file(messages, file_path)?,
        OutputFormat::Json => write_json_file(messages, file_path)?,
    }

    Ok(std::fs::metadata(file_path)?.len())
}

/// Format: `sender, timestamp, text` with a blank line between messages
fn write_txt_file<'a>(messages: impl IntoIterator<Item = &'a ChatMessage>, file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = BufWriter::new(file);

    for message in messages {
        writeln!(
            writer,
            "{}, {}, {}",
            message.sender,
            message.timestamp.format(TIMESTAMP_FORMAT),
            message.text
        )?;
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Header row: `ID, Sender, Datetime, Message, Flags`
fn write_csv_file<'a>(messages: impl IntoIterator<Item = &'a ChatMessage>, file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(["ID", "Sender", "Datetime", "Message", "Flags"])?;

    for (i, message) in messages.into_iter().enumerate() {
        writer.write_record([
            &(i + 1).to_string(),
            &message.sender,
            &message.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            &message.text,
            &message.flags.labels(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// A JSON array of the full message records
fn write_json_file<'a>(messages: impl IntoIterator<Item = &'a ChatMessage>, file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = BufWriter::new(file);

    let records: Vec<&ChatMessage> = messages.into_iter().collect();
    serde_json::to_writer_pretty(&mut writer, &records)?;
    writer.flush()?;
    Ok(())
}
