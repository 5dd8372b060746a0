//! Text renderings of a field query: CSV and a tab-separated table.

use super::FieldRow;

/// `date,file,<fields>` header followed by one line per row. Missing values are empty.
pub fn to_csv(rows: &[FieldRow], fields: &[String]) -> String {
    let mut out = String::new();
    let header: Vec<String> = ["date", "file"]
        .iter()
        .map(|s| s.to_string())
        .chain(fields.iter().cloned())
        .collect();
    push_line(&mut out, header.iter().map(|h| csv_escape(h)));

    for row in rows {
        let cells = [csv_escape(&row.date), csv_escape(&row.file)]
            .into_iter()
            .chain(fields.iter().map(|f| csv_escape(&row.cell(f))));
        push_line(&mut out, cells);
    }
    out
}

/// `date` plus each field, tab-separated. Missing values show as `-`.
pub fn to_table(rows: &[FieldRow], fields: &[String]) -> String {
    let mut out = String::new();
    let header = std::iter::once("date".to_string()).chain(fields.iter().cloned());
    out.push_str(&header.collect::<Vec<_>>().join("\t"));
    out.push('\n');

    for row in rows {
        let cells = std::iter::once(row.date.clone()).chain(fields.iter().map(|f| {
            let cell = row.cell(f);
            if cell.is_empty() {
                "-".to_string()
            } else {
                cell
            }
        }));
        out.push_str(&cells.collect::<Vec<_>>().join("\t"));
        out.push('\n');
    }
    out
}

fn push_line(out: &mut String, cells: impl Iterator<Item = String>) {
    out.push_str(&cells.collect::<Vec<_>>().join(","));
    out.push('\n');
}

fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
