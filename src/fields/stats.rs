//! Numeric summaries of frontmatter fields.

use serde::Serialize;

use crate::journal::types::MetaValue;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    /// Mean, rounded to two decimals.
    pub avg: f64,
    pub values: Vec<f64>,
    pub skipped_values: Vec<String>,
    pub skipped_count: usize,
}

/// Numeric reading of a cleaned frontmatter value.
///
/// Numbers are taken as-is, numeric text is parsed, and a range such as
/// `"4-6"` counts as its midpoint. Booleans and other text have no reading.
pub fn numeric_value(value: &MetaValue) -> Option<f64> {
    match value {
        MetaValue::Integer(_) | MetaValue::Float(_) => value.as_f64(),
        MetaValue::Text(text) => parse_number_or_range(text),
        MetaValue::Bool(_) => None,
    }
}

fn parse_number_or_range(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Ok(n) = text.parse::<f64>() {
        return n.is_finite().then_some(n);
    }
    let (low, high) = text.split_once('-')?;
    if high.contains('-') {
        return None;
    }
    let low = low.trim().parse::<f64>().ok()?;
    let high = high.trim().parse::<f64>().ok()?;
    let mid = (low + high) / 2.0;
    mid.is_finite().then_some(mid)
}

/// Summarize the values seen for one field. `None` when nothing was numeric.
pub fn summarize<'a>(values: impl IntoIterator<Item = &'a MetaValue>) -> Option<FieldStats> {
    let mut numbers = Vec::new();
    let mut skipped_values = Vec::new();
    for value in values {
        match numeric_value(value) {
            Some(n) => numbers.push(n),
            None => skipped_values.push(value.to_string()),
        }
    }
    if numbers.is_empty() {
        return None;
    }

    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = numbers.iter().sum::<f64>() / numbers.len() as f64;
    Some(FieldStats {
        count: numbers.len(),
        min,
        max,
        avg: (avg * 100.0).round() / 100.0,
        values: numbers,
        skipped_count: skipped_values.len(),
        skipped_values,
    })
}
