//! Structured queries over journal frontmatter.
//!
//! Every dated entry (`date: YYYY-MM-DD`) becomes a row holding the requested
//! fields. Rows can be limited to an inclusive date range, summarized per
//! field, and rendered as CSV or a tab-separated table.

pub mod output;
pub mod stats;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::JournalConfig;
use crate::error::JournalError;
use crate::journal::frontmatter;
use crate::journal::scan::scan_journal;
use crate::journal::types::MetaValue;
use stats::FieldStats;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "table" => Ok(Self::Table),
            other => Err(JournalError::invalid(format!(
                "unsupported format '{other}', expected json, csv or table"
            ))),
        }
    }
}

/// A validated field query.
#[derive(Debug, Clone)]
pub struct FieldQuery {
    pub fields: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub stats: bool,
    pub format: OutputFormat,
}

impl FieldQuery {
    /// Build a query from loosely-typed caller input. `fields` falls back to
    /// `default_fields`; dates must be `YYYY-MM-DD`.
    pub fn parse(
        fields: Option<Vec<String>>,
        default_fields: &[String],
        start_date: Option<&str>,
        end_date: Option<&str>,
        stats: bool,
        format: Option<&str>,
    ) -> Result<Self, JournalError> {
        let mut requested: Vec<String> = Vec::new();
        for field in fields.unwrap_or_else(|| default_fields.to_vec()) {
            let field = field.trim().to_string();
            // `date` and `file` are always present as row columns.
            let reserved = field == "date" || field == "file";
            if !field.is_empty() && !reserved && !requested.contains(&field) {
                requested.push(field);
            }
        }
        if requested.is_empty() {
            return Err(JournalError::invalid("fields must name at least one field"));
        }

        let start_date = start_date.map(|d| parse_date("start_date", d)).transpose()?;
        let end_date = end_date.map(|d| parse_date("end_date", d)).transpose()?;
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(JournalError::invalid(format!(
                    "start_date {start} is after end_date {end}"
                )));
            }
        }

        Ok(Self {
            fields: requested,
            start_date,
            end_date,
            stats,
            format: format.map(str::parse::<OutputFormat>).transpose()?.unwrap_or_default(),
        })
    }

    fn in_range(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }
}

fn parse_date(name: &str, value: &str) -> Result<NaiveDate, JournalError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| JournalError::invalid(format!("{name} must be YYYY-MM-DD, got '{value}'")))
}

/// One dated entry. Serializes flat: `date`, `file`, then one key per field.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldRow {
    pub date: String,
    pub file: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<MetaValue>>,
}

impl FieldRow {
    /// Plain-text cell for `field`; empty when absent.
    pub fn cell(&self, field: &str) -> String {
        match self.values.get(field) {
            Some(Some(value)) => value.to_string(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldReport {
    pub data: Vec<FieldRow>,
    pub fields_queried: Vec<String>,
    pub files_processed: usize,
    pub records_found: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<BTreeMap<String, FieldStats>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_output: Option<String>,
}

/// Run `query` against the journal configured in `config`.
pub fn query_fields(config: &JournalConfig, query: &FieldQuery) -> Result<FieldReport, JournalError> {
    let root = config.resolved_journal_root();
    let files = scan_journal(&root, &config.journal.extensions, &config.journal.skip_prefixes)
        .map_err(JournalError::Journal)?;

    let mut dated = Vec::new();
    for file in &files {
        let entry = match frontmatter::parse_file(&file.path) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(source = %file.source, error = %e, "skipping unparseable journal entry");
                continue;
            }
        };
        let Some(raw_date) = entry.metadata.date.as_deref() else {
            continue;
        };
        let Ok(date) = NaiveDate::parse_from_str(raw_date.trim(), DATE_FORMAT) else {
            tracing::debug!(source = %file.source, date = raw_date, "ignoring entry with non-ISO date");
            continue;
        };
        if !query.in_range(date) {
            continue;
        }

        let values = query
            .fields
            .iter()
            .map(|f| (f.clone(), entry.metadata.value(f).map(strip_comment)))
            .collect();
        let row = FieldRow {
            date: date.format(DATE_FORMAT).to_string(),
            file: file.source.clone(),
            values,
        };
        dated.push((date, row));
    }

    // Stable sort keeps source order within a day.
    dated.sort_by_key(|(date, _)| *date);
    let rows: Vec<FieldRow> = dated.into_iter().map(|(_, row)| row).collect();

    let stats = query.stats.then(|| {
        query
            .fields
            .iter()
            .filter_map(|field| {
                let values = rows.iter().filter_map(|r| r.values.get(field).and_then(Option::as_ref));
                stats::summarize(values).map(|s| (field.clone(), s))
            })
            .collect::<BTreeMap<_, _>>()
    });

    let date_range = (query.start_date.is_some() || query.end_date.is_some()).then(|| DateRange {
        start: query.start_date.map(|d| d.format(DATE_FORMAT).to_string()),
        end: query.end_date.map(|d| d.format(DATE_FORMAT).to_string()),
    });

    let (csv_output, table_output) = match query.format {
        OutputFormat::Json => (None, None),
        OutputFormat::Csv => (Some(output::to_csv(&rows, &query.fields)), None),
        OutputFormat::Table => (None, Some(output::to_table(&rows, &query.fields))),
    };

    tracing::info!(
        files = files.len(),
        records = rows.len(),
        fields = query.fields.len(),
        "frontmatter query complete"
    );

    Ok(FieldReport {
        fields_queried: query.fields.clone(),
        files_processed: files.len(),
        records_found: rows.len(),
        data: rows,
        date_range,
        stats,
        csv_output,
        table_output,
    })
}

/// Text after a `#` is an inline comment.
fn strip_comment(value: MetaValue) -> MetaValue {
    match value {
        MetaValue::Text(text) => {
            let kept = text.split('#').next().unwrap_or_default().trim();
            MetaValue::Text(kept.to_string())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Vec<String> {
        vec!["mood".into(), "anxiety".into()]
    }

    #[test]
    fn parse_uses_default_fields_and_dedups() {
        let q = FieldQuery::parse(None, &defaults(), None, None, false, None).unwrap();
        assert_eq!(q.fields, defaults());
        assert_eq!(q.format, OutputFormat::Json);

        let q = FieldQuery::parse(
            Some(vec!["mood".into(), " mood ".into(), "sleep".into()]),
            &defaults(),
            None,
            None,
            false,
            Some("CSV"),
        )
        .unwrap();
        assert_eq!(q.fields, vec!["mood".to_string(), "sleep".to_string()]);
        assert_eq!(q.format, OutputFormat::Csv);
    }

    #[test]
    fn parse_rejects_bad_input() {
        let bad_date = FieldQuery::parse(None, &defaults(), Some("03/01/2024"), None, false, None);
        assert!(bad_date.unwrap_err().is_client_error());

        let reversed =
            FieldQuery::parse(None, &defaults(), Some("2024-03-02"), Some("2024-03-01"), false, None);
        assert!(reversed.unwrap_err().is_client_error());

        let format = FieldQuery::parse(None, &defaults(), None, None, false, Some("xml"));
        assert!(format.unwrap_err().to_string().contains("unsupported format"));

        let empty = FieldQuery::parse(Some(vec![" ".into()]), &defaults(), None, None, false, None);
        assert!(empty.unwrap_err().is_client_error());
    }

    #[test]
    fn range_is_inclusive() {
        let q = FieldQuery::parse(None, &defaults(), Some("2024-03-01"), Some("2024-03-31"), false, None)
            .unwrap();
        let day = |s: &str| NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap();
        assert!(q.in_range(day("2024-03-01")));
        assert!(q.in_range(day("2024-03-31")));
        assert!(!q.in_range(day("2024-04-01")));
    }

    #[test]
    fn comments_are_cut() {
        assert_eq!(
            strip_comment(MetaValue::Text("6 # rough night".into())),
            MetaValue::Text("6".into())
        );
        assert_eq!(strip_comment(MetaValue::Integer(6)), MetaValue::Integer(6));
    }

    #[test]
    fn row_serializes_flat_with_nulls() {
        let mut values = BTreeMap::new();
        values.insert("mood".to_string(), Some(MetaValue::Integer(5)));
        values.insert("anxiety".to_string(), None);
        let row = FieldRow {
            date: "2024-03-01".into(),
            file: "2024-03-01.md".into(),
            values,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["mood"], 5);
        assert!(json["anxiety"].is_null());
        assert_eq!(json["file"], "2024-03-01.md");
    }
}
