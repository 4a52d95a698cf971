use crate::error::TableParseError;
use crate::models::{MetricRow, MetricsTable};
use regex::Regex;

/// Best-effort parse of the provider's metrics output. The CSV shape is a
/// prompt instruction, not a schema the provider is bound to, so this
/// tolerates prose, code fences, and markdown pipes around the table and
/// reports failure instead of guessing. Callers fall back to the raw text.
pub fn parse_metrics_table(text: &str) -> Result<MetricsTable, TableParseError> {
    let header_re = Regex::new(
        r"(?i)^\s*\|?\s*metric\s*[,|]\s*current\s+period\s*[,|]\s*previous\s+period\s*[,|]\s*change\s*\|?\s*$",
    )?;
    let divider_re = Regex::new(r"^[\s|:\-]+$")?;

    let mut lines = text.lines();
    let mut found_header = false;
    for line in lines.by_ref() {
        if header_re.is_match(line) {
            found_header = true;
            break;
        }
    }
    if !found_header {
        return Err(TableParseError::MissingHeader);
    }

    let mut rows = Vec::new();
    for line in lines {
        let line = line.trim().trim_matches('|').trim();
        if line.is_empty() || line.starts_with("```") {
            if rows.is_empty() {
                continue;
            }
            break;
        }
        if divider_re.is_match(line) {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 4 {
            // Thousands separators make comma counts ambiguous; skip rather
            // than misassign columns.
            if rows.is_empty() {
                continue;
            }
            break;
        }

        rows.push(MetricRow {
            metric: fields[0].to_string(),
            current: fields[1].to_string(),
            previous: fields[2].to_string(),
            change: fields[3].to_string(),
        });
    }

    if rows.is_empty() {
        return Err(TableParseError::NoRows);
    }

    Ok(MetricsTable { rows })
}
