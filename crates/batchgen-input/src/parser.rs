use std::fs::File;
use std::path::Path;

use batchgen_core::WorkItem;
use tracing::{info, warn};
use uuid::Uuid;

const HEADER_FIRST_FIELDS: [&str; 3] = ["artist_id", "id", "uuid"];

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("could not open input file {path}: {source}")]
    Open { path: String, #[source] source: std::io::Error },
    #[error("error reading CSV row from {path}: {source}")]
    Csv { path: String, #[source] source: csv::Error },
}

/// Summary of a CSV load: successfully parsed items plus counters for the
/// lines that were skipped on purpose (comments, blanks, a detected header)
/// versus lines that failed validation.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub items: Vec<WorkItem>,
    pub skipped_lines: usize,
    pub error_lines: usize,
}

/// Loads a catalog CSV with the format `id,name,data?`.
///
/// Lines starting with `#` and blank lines are skipped silently. A first
/// data row whose first field looks like a header name (`artist_id`, `id`,
/// `uuid`) is treated as a header and skipped once. Rows that don't parse —
/// too few columns, a malformed UUID, a blank name — are counted as error
/// lines and skipped rather than aborting the whole load, so one bad row in
/// a large catalog doesn't lose every other row.
pub fn parse_input_file(path: impl AsRef<Path>) -> Result<ParseOutcome, InputError> {
    let path_ref = path.as_ref();
    let path_display = path_ref.display().to_string();

    let file = File::open(path_ref).map_err(|source| InputError::Open { path: path_display.clone(), source })?;
    let mut reader = csv::ReaderBuilder::new().has_headers(false).flexible(true).from_reader(file);

    let mut outcome = ParseOutcome::default();
    let mut header_skipped = false;

    for (line_num, record) in reader.records().enumerate() {
        let line_num = line_num + 1;
        let record = record.map_err(|source| InputError::Csv { path: path_display.clone(), source })?;

        if record.is_empty() || (record.len() == 1 && record.get(0).unwrap_or("").trim().is_empty()) {
            outcome.skipped_lines += 1;
            continue;
        }

        let first_field = record.get(0).unwrap_or("").trim();
        if first_field.starts_with('#') {
            outcome.skipped_lines += 1;
            continue;
        }

        if !header_skipped && record.len() >= 2 && HEADER_FIRST_FIELDS.contains(&first_field.to_lowercase().as_str()) {
            header_skipped = true;
            outcome.skipped_lines += 1;
            continue;
        }

        if record.len() < 2 {
            warn!(line_num, "insufficient columns, need at least id,name");
            outcome.error_lines += 1;
            continue;
        }

        let raw_id = record.get(0).unwrap_or("").trim();
        let name = record.get(1).unwrap_or("").trim();
        let extra = record.get(2).map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

        let id = match Uuid::parse_str(raw_id) {
            Ok(id) => id,
            Err(_) => {
                warn!(line_num, raw_id, "invalid UUID, skipping");
                outcome.error_lines += 1;
                continue;
            }
        };

        match WorkItem::new(id, name, extra) {
            Ok(item) => outcome.items.push(item),
            Err(_) => {
                warn!(line_num, "empty artist name, skipping");
                outcome.error_lines += 1;
            }
        }
    }

    info!(path = %path_display, parsed = outcome.items.len(), "parsed catalog input");
    if outcome.skipped_lines > 0 {
        info!(skipped = outcome.skipped_lines, "skipped comment/blank/header lines");
    }
    if outcome.error_lines > 0 {
        warn!(errors = outcome.error_lines, "encountered error lines");
    }

    Ok(outcome)
}
