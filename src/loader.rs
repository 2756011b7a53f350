use std::path::Path;

use crate::error::{Error, Result};
use crate::sorter::CellValue;

/// Parse an uploaded spreadsheet into rows of cells
///
/// The format is picked from the file extension. CSV files are read with the
/// csv crate, so quoted fields may span lines; Excel and OpenDocument
/// workbooks are read with calamine, using the first worksheet only.
/// Whole-number cells become integers, blanks become empty strings and rows
/// with no content are dropped wherever they appear.
///
/// # Arguments
/// * `filename` - Name of the uploaded file, used only for its extension
/// * `bytes` - Raw file content
///
/// # Errors
/// * [`Error::UnsupportedFormat`] for unknown or missing extensions
/// * [`Error::InvalidInput`] for empty files and workbooks without sheets
/// * [`Error::Csv`] for malformed CSV
///
/// # Examples
/// ```
/// use size_sorter::loader::parse_spreadsheet;
///
/// let rows = parse_spreadsheet("sizes.csv", "姓名,尺码\nAmy,M\n".as_bytes()).unwrap();
/// assert_eq!(rows.len(), 2);
/// ```
pub fn parse_spreadsheet(filename: &str, bytes: &[u8]) -> Result<Vec<Vec<CellValue>>> {
    if bytes.is_empty() {
        return Err(Error::invalid("上传的文件为空"));
    }

    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    let mut rows = match extension.as_deref() {
        Some("csv") => from_csv(bytes)?,
        #[cfg(feature = "web")]
        Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("ods") => {
            from_workbook(bytes)?
        }
        #[cfg(not(feature = "web"))]
        Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("ods") => {
            return Err(Error::UnsupportedFormat(
                "工作簿格式需要启用 web 功能".to_string(),
            ));
        }
        Some(ext) => return Err(Error::UnsupportedFormat(ext.to_string())),
        None => return Err(Error::UnsupportedFormat("文件没有扩展名".to_string())),
    };

    rows.retain(|row| !row.iter().all(is_blank));
    Ok(rows)
}

fn is_blank(cell: &CellValue) -> bool {
    matches!(cell, CellValue::Text(s) if s.trim().is_empty())
}

fn from_csv(bytes: &[u8]) -> Result<Vec<Vec<CellValue>>> {
    let bytes = bytes.strip_prefix("\u{feff}".as_bytes()).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(csv_cell).collect());
    }
    Ok(rows)
}

fn csv_cell(field: &str) -> CellValue {
    match field.trim().parse::<i64>() {
        Ok(n) => CellValue::Int(n),
        Err(_) => CellValue::Text(field.to_string()),
    }
}

#[cfg(feature = "web")]
fn from_workbook(bytes: &[u8]) -> Result<Vec<Vec<CellValue>>> {
    use calamine::{Reader, open_workbook_auto_from_rs};
    use std::io::Cursor;

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::invalid("工作簿中没有工作表"))?;

    let range = workbook.worksheet_range(&sheet_name)?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(workbook_cell).collect())
        .collect())
}

#[cfg(feature = "web")]
fn workbook_cell(cell: &calamine::Data) -> CellValue {
    use calamine::Data;

    match cell {
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            CellValue::Int(*f as i64)
        }
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Empty => CellValue::Text(String::new()),
        other => CellValue::Text(other.to_string()),
    }
}
