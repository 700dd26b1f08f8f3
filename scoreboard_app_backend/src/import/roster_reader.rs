use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use scoreboard_entities::{
    domain::{roster::RosterItem, Group},
    mock::sample_participant,
};
use sea_orm::prelude::Uuid;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Column assignment for a roster sheet. `id_column` and `name_column` fall
/// back to the first two columns when no header matches.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RosterReaderConfig {
    pub id_column: usize,
    pub name_column: usize,
    pub group_column: Option<usize>,
    pub delimiter: Option<u8>,
}

impl Default for RosterReaderConfig {
    fn default() -> Self {
        RosterReaderConfig { id_column: 0, name_column: 1, group_column: None, delimiter: Some(b',') }
    }
}

#[derive(Debug, Error)]
pub enum RosterImportError {
    #[error("Could not parse roster: {0}")]
    ParseError(#[from] csv::Error),
    #[error("Could not read roster: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Roster reader is missing a delimiter")]
    BadConfig,
    #[error("No rows with a participant id found")]
    NoValidRows,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
enum RosterField {
    Id,
    Name,
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// Zero-based index of the data row, not counting the header.
    SkippedRowMissingId { index: usize },
}

#[derive(Debug, Clone)]
pub struct ParseResult {
    pub items: Vec<RosterItem>,
    pub warnings: Vec<ParseWarning>,
}

pub fn parse_group_cell(val: &str) -> Group {
    let val = val.trim();
    if val.contains('高') || val.to_lowercase().contains("senior") {
        Group::Senior
    } else {
        Group::Junior
    }
}

const TEMPLATE_HEADERS: [&str; 3] = ["编号", "姓名", "组别(初级组/高级组)"];
const TEMPLATE_ROWS: usize = 20;

/// A sample roster sheet that round-trips through the reader.
pub fn roster_template_csv() -> Result<String, RosterImportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);
    writer.write_record(TEMPLATE_HEADERS)?;
    for i in 0..TEMPLATE_ROWS {
        let (id, name, group) = sample_participant(i);
        let group = match group {
            Group::Junior => "初级组",
            Group::Senior => "高级组",
        };
        writer.write_record([id.as_str(), name.as_str(), group])?;
    }
    let bytes = writer.into_inner().map_err(|e| RosterImportError::IoError(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

impl RosterReaderConfig {
    pub fn default_from_file<R>(mut reader: R) -> Result<RosterReaderConfig, RosterImportError>
    where
        R: std::io::Read,
    {
        let delimiter_candidates = [b',', b';', b'\t'];
        let mut delimiter_counts = [0; 3];
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;

        for char in buffer.iter() {
            for (i, delimiter) in delimiter_candidates.iter().enumerate() {
                if char == delimiter {
                    delimiter_counts[i] += 1;
                }
            }
        }

        let delimiter = delimiter_counts
            .into_iter()
            .enumerate()
            .max_by_key(|(_, c)| *c)
            .map(|(i, _)| delimiter_candidates[i])
            .unwrap_or(b',');
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(&buffer[..]);
        let headers = reader.headers()?;

        let mut config = Self::propose_config_from_headers(headers.into_iter());
        config.delimiter = Some(delimiter);
        debug!(?config, "Proposed roster columns");
        Ok(config)
    }

    /// Column proposal for rows that were already split, e.g. a converted
    /// spreadsheet. The delimiter stays unset.
    pub fn from_header_row<S: AsRef<str>>(headers: &[S]) -> RosterReaderConfig {
        Self::propose_config_from_headers(headers.iter().map(|h| h.as_ref()))
    }

    fn propose_config_from_headers<'a, I>(headers: I) -> RosterReaderConfig
    where
        I: Iterator<Item = &'a str>,
    {
        lazy_static! {
            static ref FIELD_HEADER_PATTERNS: Vec<(RosterField, Regex)> = {
                let patterns: Vec<(RosterField, Vec<&str>)> = vec![
                    (RosterField::Id, vec!["编号", "id", "code"]),
                    (RosterField::Name, vec!["姓名", "name"]),
                    (RosterField::Group, vec!["组别", "组", "group"]),
                ];

                patterns.into_iter()
                    .filter_map(|(key, patterns)| {
                        RegexBuilder::new(&patterns.join("|"))
                            .case_insensitive(true)
                            .build()
                            .ok()
                            .map(|regex| (key, regex))
                    })
                    .collect()
            };
        }

        let mut proposed_column_assignment = HashMap::new();
        for (header_idx, header) in headers.enumerate() {
            let header = header.trim();
            for (field, pattern) in FIELD_HEADER_PATTERNS.iter() {
                if pattern.is_match(header) && !proposed_column_assignment.contains_key(field) {
                    proposed_column_assignment.insert(*field, header_idx);
                }
            }
        }

        RosterReaderConfig {
            id_column: proposed_column_assignment.remove(&RosterField::Id).unwrap_or(0),
            name_column: proposed_column_assignment.remove(&RosterField::Name).unwrap_or(1),
            group_column: proposed_column_assignment.remove(&RosterField::Group),
            delimiter: None,
        }
    }

    pub fn parse<R>(&self, reader: R, sub_event_id: Uuid) -> Result<ParseResult, RosterImportError>
    where
        R: std::io::Read,
    {
        let delimiter = self.delimiter.ok_or(RosterImportError::BadConfig)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let rows = reader.records()
            .map(|row| row.map(|r| r.iter().map(|c| c.to_string()).collect::<Vec<_>>()))
            .collect::<Result<Vec<_>, _>>()?;
        self.parse_rows(rows, sub_event_id)
    }

    /// Parses data rows (header row excluded).
    pub fn parse_rows<I, S>(&self, rows: I, sub_event_id: Uuid) -> Result<ParseResult, RosterImportError>
    where
        I: IntoIterator<Item = Vec<S>>,
        S: AsRef<str>,
    {
        let mut items = vec![];
        let mut warnings = vec![];

        for (row_idx, row) in rows.into_iter().enumerate() {
            let cell = |index: usize| row.get(index).map(|c| c.as_ref().trim()).unwrap_or("");

            let id = cell(self.id_column);
            if id.is_empty() {
                warnings.push(ParseWarning::SkippedRowMissingId { index: row_idx });
                continue;
            }
            let name = match cell(self.name_column) {
                "" => id,
                name => name,
            };
            let group = self.group_column.map(|index| parse_group_cell(cell(index))).unwrap_or_default();

            items.push(RosterItem {
                id: id.to_string(),
                name: name.to_string(),
                group,
                sub_event_id,
            });
        }

        if items.is_empty() {
            return Err(RosterImportError::NoValidRows);
        }

        Ok(ParseResult { items, warnings })
    }
}
