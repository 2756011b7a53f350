#![cfg(not(tarpaulin_include))]

use size_sorter::downloader::{self, ExportFormat};
use size_sorter::loader::parse_spreadsheet;
use size_sorter::sorter::sort_table;
use size_sorter::store::RecordStore;
use std::env;
use std::fs;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <input.xlsx|input.csv> [output.csv|output.xlsx]", args[0]);
        return Ok(());
    }

    let input = Path::new(&args[1]);
    let bytes = fs::read(input)?;
    let filename = input
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    let data = parse_spreadsheet(filename, &bytes)?;
    let entries = sort_table(&data)?;

    let store = RecordStore::in_memory();
    let records = store.replace_all(&entries)?;

    match args.get(2) {
        None => print!("{}", downloader::to_csv(&records)),
        Some(output) => {
            let format = match Path::new(output).extension().and_then(|e| e.to_str()) {
                Some("xlsx") => ExportFormat::Excel,
                _ => ExportFormat::Csv,
            };
            match format {
                ExportFormat::Csv => fs::write(output, downloader::to_csv(&records))?,
                ExportFormat::Excel => fs::write(output, downloader::to_xlsx(&records)?)?,
            }
            eprintln!("Wrote {} sorted rows to {}", records.len(), output);
        }
    }

    Ok(())
}
