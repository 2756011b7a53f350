/*!
# Size Sorter

Sorts an uploaded roster of names and clothing sizes into size order and
serves the result as a table and as CSV or Excel downloads.

## Overview

A single upload page lets a user pick a spreadsheet. The page parses the
file in the browser and posts the rows to the service; `/upload` accepts the
raw file instead and parses it on the server. The table's first two columns are read as name and size, and the rows are reordered
from the smallest size to the largest. The sorted table replaces the stored
records and can then be downloaded.

## Size Ordering

Sizes rank as `100 110 120 130 140 150 XS S M L XL 2XL ... 10XL`. Repeated-X
labels (`XXL`, `XXXL`) are rewritten to their numbered form before ranking.
Within one size, shorter names come first, then names in code point order.
Labels that cannot be placed sort after everything else.

## Modules

- **size**: Size label normalisation and ranking
- **sorter**: Table validation and ordering
- **loader**: Spreadsheet upload parsing (CSV, XLSX, XLS, XLSB, ODS)
- **store**: Record snapshot with gzip compression and bincode serialization
- **downloader**: Export functionality (CSV, XLSX)
- **config**: Environment configuration
- **app**: Routing and middleware

## REST API Endpoints

- `GET /` - Welcome message
- `GET /ui` - Upload page
- `GET /test-db` - Record store health check
- `POST /process-data` - Sort a JSON table
- `POST /upload` - Sort an uploaded spreadsheet file
- `GET /get-records` - Stored records
- `GET /download/{csv|excel}` - Download stored records
*/

pub mod config;
pub mod downloader;
pub mod error;
pub mod loader;
pub mod size;
pub mod sorter;
pub mod store;

#[cfg(feature = "web")]
pub mod app;

pub use error::{Error, Result};
pub use size::{normalize_size, size_rank};
pub use sorter::{CellValue, SizedEntry, SortRequest, SortResponse};
pub use store::{RecordStore, SizeRecord};
