use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::size::{normalize_size, size_rank};

/// Header row of every sorted table.
pub const OUTPUT_HEADER: [&str; 3] = ["序号", "姓名", "尺码"];

/// A single spreadsheet cell as it travels over JSON
///
/// Parsed spreadsheets mix text and whole numbers (sequence numbers, numeric
/// heights like `130`), so cells are accepted and emitted as either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Int(n)
    }
}

/// Body of a sort request: the uploaded table, header row first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortRequest {
    pub data: Vec<Vec<CellValue>>,
    pub rows_per_column: u32,
}

/// Body of a sort response: the renumbered table plus the layout hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortResponse {
    pub processed_data: Vec<Vec<CellValue>>,
    pub rows_per_column: u32,
}

/// One sorted row: sequence number, name, normalized size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizedEntry {
    pub seq: u32,
    pub name: String,
    pub size: String,
}

/// Sort an uploaded table by size
///
/// The first row is the header and must have at least two columns; the
/// first column of each following row is the name and the second is the
/// size. Any further columns are ignored. Rows are ordered by size rank,
/// then by name length in characters, then by name. Equal keys keep their
/// upload order. The result is renumbered from 1.
///
/// # Errors
/// * [`Error::InvalidInput`] when the table has fewer than two rows, the
///   header has fewer than two columns, or a data row has fewer than two cells
pub fn sort_table(data: &[Vec<CellValue>]) -> Result<Vec<SizedEntry>> {
    if data.len() < 2 {
        return Err(Error::invalid("数据为空或少于2行（包括表头）"));
    }

    let header = &data[0];
    if header.len() < 2 {
        return Err(Error::invalid(format!(
            "数据应至少包含2列。当前列数: {}",
            header.len()
        )));
    }

    let mut keyed = Vec::with_capacity(data.len() - 1);
    for (i, row) in data[1..].iter().enumerate() {
        if row.len() < 2 {
            // Row numbers are 1-based and count the header.
            return Err(Error::invalid(format!(
                "第{}行只有{}个单元格，至少需要2个",
                i + 2,
                row.len()
            )));
        }
        let name = row[0].to_string();
        let size = normalize_size(&row[1].to_string());
        let rank = size_rank(&size);
        let name_len = name.chars().count();
        keyed.push(((rank, name_len), name, size));
    }

    keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    Ok(keyed
        .into_iter()
        .enumerate()
        .map(|(i, (_, name, size))| SizedEntry {
            seq: (i + 1) as u32,
            name,
            size,
        })
        .collect())
}

/// Render sorted entries as a table with [`OUTPUT_HEADER`].
pub fn to_table(entries: &[SizedEntry]) -> Vec<Vec<CellValue>> {
    let mut table = Vec::with_capacity(entries.len() + 1);
    table.push(OUTPUT_HEADER.iter().map(|h| CellValue::from(*h)).collect());
    for entry in entries {
        table.push(vec![
            CellValue::Int(entry.seq as i64),
            CellValue::Text(entry.name.clone()),
            CellValue::Text(entry.size.clone()),
        ]);
    }
    table
}

/// Sort a request and build its response.
pub fn process(request: &SortRequest) -> Result<(Vec<SizedEntry>, SortResponse)> {
    let entries = sort_table(&request.data)?;
    let response = SortResponse {
        processed_data: to_table(&entries),
        rows_per_column: request.rows_per_column,
    };
    Ok((entries, response))
}
