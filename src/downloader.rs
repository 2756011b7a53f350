use chrono::{DateTime, TimeZone};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::sorter::OUTPUT_HEADER;
use crate::store::SizeRecord;

/// Worksheet title used for Excel exports.
pub const SHEET_NAME: &str = "尺码记录";

/// Download formats offered for the stored records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(ExportFormat::Csv),
            "excel" => Ok(ExportFormat::Excel),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => f.write_str("csv"),
            ExportFormat::Excel => f.write_str("excel"),
        }
    }
}

/// Attachment name for an export, e.g. `size_records_20240301_093000.csv`.
pub fn export_filename<Tz: TimeZone>(format: ExportFormat, now: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    format!(
        "size_records_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Convert records to CSV format
///
/// The first line is the `序号,姓名,尺码` header. Fields containing commas,
/// quotes or line breaks are quoted, with embedded quotes doubled.
///
/// # Examples
/// ```
/// use size_sorter::downloader::to_csv;
///
/// assert_eq!(to_csv(&[]), "序号,姓名,尺码\n");
/// ```
pub fn to_csv(records: &[SizeRecord]) -> String {
    let mut csv_content = OUTPUT_HEADER.join(",");
    csv_content.push('\n');

    for record in records {
        csv_content.push_str(&record.seq.to_string());
        csv_content.push(',');
        push_csv_field(&mut csv_content, &record.name);
        csv_content.push(',');
        push_csv_field(&mut csv_content, &record.size);
        csv_content.push('\n');
    }

    csv_content
}

fn push_csv_field(out: &mut String, value: &str) {
    if value.contains([',', '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&value.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(value);
    }
}

/// Convert records to XLSX format
///
/// Produces a single worksheet named [`SHEET_NAME`] with narrow sequence and
/// size columns and a wider name column. Every written cell is centred and
/// boxed with thin borders; the header row is bold.
///
/// # Returns
/// * `Result<Vec<u8>>` - XLSX file content as bytes or an error
#[cfg(feature = "web")]
pub fn to_xlsx(records: &[SizeRecord]) -> Result<Vec<u8>> {
    use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name(SHEET_NAME)?;

    worksheet.set_column_width(0, 8)?;
    worksheet.set_column_width(1, 15)?;
    worksheet.set_column_width(2, 8)?;

    let cell_format = Format::new()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);
    let header_format = cell_format.clone().set_bold();

    for (col, title) in OUTPUT_HEADER.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header_format)?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_number_with_format(row, 0, record.seq, &cell_format)?;
        worksheet.write_string_with_format(row, 1, &record.name, &cell_format)?;
        worksheet.write_string_with_format(row, 2, &record.size, &cell_format)?;
    }

    workbook.push_worksheet(worksheet);

    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}
