//! CSV intake for the transfer dataset.
//!
//! Columns are addressed by header name, so column order in the file does
//! not matter and extra columns are ignored. Rows that fail to parse are
//! skipped with a debug log rather than failing the whole load; a missing
//! required column fails immediately because nothing useful can be read.

use std::path::Path;

use eyre::{eyre, Result, WrapErr};

use crate::types::{Direction, TransferRecord};

/// Acting club column.
pub const COL_TEAM: &str = "team_name";
/// Counter-party club column.
pub const COL_COUNTER_TEAM: &str = "counter_team_name";
/// Direction flag column (`in` / `left`).
pub const COL_DIR: &str = "dir";
/// Fee column, base currency units.
pub const COL_FEE: &str = "transfer_fee_amnt";

/// Read and parse a transfer dataset from disk.
///
/// # Errors
/// Returns error if the file cannot be read or the header is unusable.
pub fn load_path(path: &Path) -> Result<Vec<TransferRecord>> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    parse_str(&content)
}

/// Parse a transfer dataset from CSV text.
///
/// The first non-empty line is the header. Rows with a missing field,
/// an unknown direction value, or an unparsable fee are skipped.
///
/// # Errors
/// Returns error if the text is empty or a required column is missing.
pub fn parse_str(content: &str) -> Result<Vec<TransferRecord>> {
    let mut lines = content.lines().enumerate();

    let (_, header) = lines
        .by_ref()
        .find(|(_, line)| !line.trim().is_empty())
        .ok_or_else(|| eyre!("dataset is empty"))?;
    let columns = HeaderIndex::from_header(header)?;

    let mut records = Vec::new();
    for (line_number, line) in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let fields = split_fields(trimmed);
        match columns.parse_row(&fields) {
            Some(record) => records.push(record),
            None => {
                tracing::debug!(line_number, "skipping malformed transfer row");
            }
        }
    }

    Ok(records)
}

/// Column positions resolved from the header row.
struct HeaderIndex {
    team: usize,
    counter_team: usize,
    dir: usize,
    fee: usize,
}

impl HeaderIndex {
    fn from_header(header: &str) -> Result<Self> {
        let names = split_fields(header);
        let position = |wanted: &str| -> Result<usize> {
            names
                .iter()
                .position(|name| name.trim() == wanted)
                .ok_or_else(|| eyre!("missing required column '{}'", wanted))
        };

        Ok(Self {
            team: position(COL_TEAM)?,
            counter_team: position(COL_COUNTER_TEAM)?,
            dir: position(COL_DIR)?,
            fee: position(COL_FEE)?,
        })
    }

    fn parse_row(&self, fields: &[String]) -> Option<TransferRecord> {
        let team = fields.get(self.team)?.trim();
        let counter_team = fields.get(self.counter_team)?.trim();
        if team.is_empty() || counter_team.is_empty() {
            return None;
        }

        let dir = Direction::parse(fields.get(self.dir)?)?;
        let fee = fields.get(self.fee)?.trim().parse::<f64>().ok()?;
        if !fee.is_finite() || fee < 0.0 {
            return None;
        }

        Some(TransferRecord {
            team: team.to_string(),
            counter_team: counter_team.to_string(),
            dir,
            fee,
        })
    }
}

/// Split one CSV line into fields.
///
/// Honors double-quoted fields because club names contain commas
/// (e.g. `"1. FC Köln, II"`); `""` inside quotes is an escaped quote.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);

    fields
}
