use anyhow::Result;

use crate::config::JournalConfig;
use crate::fields::{query_fields, FieldQuery, OutputFormat};

/// Print frontmatter fields across dated entries.
pub fn fields(
    config: &JournalConfig,
    fields: Option<Vec<String>>,
    start_date: Option<&str>,
    end_date: Option<&str>,
    stats: bool,
    format: Option<&str>,
) -> Result<()> {
    let query = FieldQuery::parse(
        fields,
        &config.fields.default_fields,
        start_date,
        end_date,
        stats,
        format,
    )?;
    let report = query_fields(config, &query)?;

    match query.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Csv => print!("{}", report.csv_output.unwrap_or_default()),
        OutputFormat::Table => print!("{}", report.table_output.unwrap_or_default()),
    }

    if query.format != OutputFormat::Json {
        if let Some(stats) = &report.stats {
            println!();
            for (field, s) in stats {
                println!(
                    "{field}: count {} min {} max {} avg {} (skipped {})",
                    s.count, s.min, s.max, s.avg, s.skipped_count
                );
            }
        }
    }
    Ok(())
}
