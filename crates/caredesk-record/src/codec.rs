//! On-disk codec for action records.
//!
//! A record file consists of:
//! 1. A frontmatter block delimited by `---` lines, holding flat
//!    `key: value` pairs (order-irrelevant).
//! 2. A free-text markdown body.
//!
//! ```text
//! ---
//! title: Appointment Reminder - J. Doe
//! type: appointment_reminder
//! created: 2026-08-29T09:30:00Z
//! urgency: normal
//! ---
//!
//! Hi Jane, this is a reminder about your appointment tomorrow at 10:00.
//! ```
//!
//! Parsing is strict about structure (a missing block or a non
//! `key: value` line is an error) and strict about recognized values
//! (a present-but-invalid `urgency` never silently defaults), but
//! tolerant of unrecognized keys, which are skipped with a warning so
//! producer-side extras cannot wedge the pipeline.
//!
//! Values are written raw when that is unambiguous; anything that
//! would break the line discipline — embedded newlines, surrounding
//! whitespace, a leading or trailing `"` — is written as a quoted,
//! backslash-escaped string and decoded symmetrically on parse. Notes
//! are free-form text, so this is what keeps a multiline approval note
//! from injecting lines into the metadata block.
//!
//! `parse(filename, serialize(r)) == r` for every record this codec
//! produces. The body is stored without surrounding blank lines.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{RecordError, Result};
use crate::record::{ActionRecord, format_ts};
use crate::types::{ActionType, Outcome, RiskCategory, Urgency};

/// Split a record file into its frontmatter block and body.
///
/// Returns `(frontmatter, body)`, or `None` when the file does not start
/// with a `---` line or the closing delimiter is missing.
fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let content = content.trim_start_matches('\u{feff}');

    if !content.starts_with("---") {
        return None;
    }

    let after_first = &content[3..];
    let end = after_first.find("\n---")?;
    let block = after_first[..end].trim();
    let body = after_first[end + 4..].trim_matches(['\n', '\r']);

    Some((block, body))
}

/// Parse a record file into an [`ActionRecord`].
///
/// `filename` is the vault filename the content was read from; it becomes
/// the record's identity.
pub fn parse(filename: &str, raw: &str) -> Result<ActionRecord> {
    let (block, body) = split_frontmatter(raw).ok_or(RecordError::MissingFrontmatter)?;

    let mut record = ActionRecord::empty(filename);
    record.body = body.to_string();

    for (line_no, line) in block.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (key, value) = trimmed
            .split_once(':')
            .ok_or_else(|| RecordError::MalformedLine {
                line: line_no + 2, // 1-based, plus the opening delimiter
                text: trimmed.to_string(),
            })?;
        let key = key.trim();
        let raw_value = value.trim();
        if raw_value.is_empty() {
            continue;
        }
        let value = decode_value(raw_value);
        let value = value.as_str();

        match key {
            "title" => record.title = Some(value.to_string()),
            "type" => record.action_type = Some(ActionType::parse(value)),
            "created" => record.created = Some(parse_ts("created", value)?),
            "urgency" => {
                record.urgency =
                    Urgency::parse(value).ok_or_else(|| RecordError::InvalidValue {
                        field: "urgency",
                        value: value.to_string(),
                    })?;
            }
            "patient_risk_category" => {
                record.risk_category =
                    RiskCategory::parse(value).ok_or_else(|| RecordError::InvalidValue {
                        field: "patient_risk_category",
                        value: value.to_string(),
                    })?;
            }
            "approved_at" => record.approved_at = Some(parse_ts("approved_at", value)?),
            "approval_notes" => record.approval_notes = Some(value.to_string()),
            "rejected_at" => record.rejected_at = Some(parse_ts("rejected_at", value)?),
            "rejection_notes" => record.rejection_notes = Some(value.to_string()),
            "executed_at" => record.executed_at = Some(parse_ts("executed_at", value)?),
            "execution_notes" => record.execution_notes = Some(value.to_string()),
            "outcome" => {
                record.outcome =
                    Some(Outcome::parse(value).ok_or_else(|| RecordError::InvalidValue {
                        field: "outcome",
                        value: value.to_string(),
                    })?);
            }
            other => {
                warn!(filename, key = other, "skipping unrecognized frontmatter key");
            }
        }
    }

    Ok(record)
}

/// Serialize a record back to its file form.
pub fn serialize(record: &ActionRecord) -> String {
    let mut out = String::from("---\n");

    if let Some(title) = &record.title {
        push(&mut out, "title", title);
    }
    if let Some(t) = &record.action_type {
        push(&mut out, "type", t.as_str());
    }
    if let Some(created) = &record.created {
        push(&mut out, "created", &format_ts(created));
    }
    // Defaults are implicit; only elevated values are written out.
    if record.urgency != Urgency::Normal {
        push(&mut out, "urgency", record.urgency.as_str());
    }
    if record.risk_category != RiskCategory::Low {
        push(&mut out, "patient_risk_category", record.risk_category.as_str());
    }
    if let Some(at) = &record.approved_at {
        push(&mut out, "approved_at", &format_ts(at));
    }
    if let Some(notes) = &record.approval_notes {
        push(&mut out, "approval_notes", notes);
    }
    if let Some(at) = &record.rejected_at {
        push(&mut out, "rejected_at", &format_ts(at));
    }
    if let Some(notes) = &record.rejection_notes {
        push(&mut out, "rejection_notes", notes);
    }
    if let Some(at) = &record.executed_at {
        push(&mut out, "executed_at", &format_ts(at));
    }
    if let Some(notes) = &record.execution_notes {
        push(&mut out, "execution_notes", notes);
    }
    if let Some(outcome) = &record.outcome {
        push(&mut out, "outcome", outcome.as_str());
    }

    out.push_str("---\n");
    if !record.body.is_empty() {
        out.push('\n');
        out.push_str(&record.body);
        out.push('\n');
    }
    out
}

fn push(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": ");
    if needs_quoting(value) {
        out.push('"');
        for c in value.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '"' => out.push_str("\\\""),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                other => out.push(other),
            }
        }
        out.push('"');
    } else {
        out.push_str(value);
    }
    out.push('\n');
}

// A raw value must survive the line discipline and a surrounding trim.
fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value != value.trim()
        || value.contains(['\n', '\r'])
        || value.starts_with('"')
        || value.ends_with('"')
}

fn decode_value(raw: &str) -> String {
    let Some(inner) = raw.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) else {
        return raw.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn parse_ts(field: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| RecordError::InvalidTimestamp {
            field,
            value: value.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
