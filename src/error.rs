//! Error types shared by the sorter, the record store and the HTTP layer.

use std::io;
use thiserror::Error;

/// Result type alias for size sorter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while sorting, storing or exporting size records.
#[derive(Error, Debug)]
pub enum Error {
    /// The uploaded table failed validation.
    #[error("{0}")]
    InvalidInput(String),

    /// The uploaded file or requested export is not in a supported format.
    #[error("不支持的文件格式: {0}")]
    UnsupportedFormat(String),

    /// I/O error while reading or writing the record snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The record snapshot could not be encoded or decoded.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),

    /// A configuration value could not be parsed.
    #[error("Invalid configuration for {key}: {reason}")]
    Config { key: String, reason: String },

    /// The uploaded CSV could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The spreadsheet reader rejected the upload.
    #[cfg(feature = "web")]
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// The workbook writer failed to build the export.
    #[cfg(feature = "web")]
    #[error("Workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    /// A blocking store task panicked or was cancelled.
    #[cfg(feature = "web")]
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// True when the error was caused by the client's request.
    pub fn is_client_error(&self) -> bool {
        match self {
            Error::InvalidInput(_) | Error::UnsupportedFormat(_) | Error::Csv(_) => true,
            // An unreadable upload is the uploader's problem.
            #[cfg(feature = "web")]
            Error::Spreadsheet(_) => true,
            _ => false,
        }
    }
}

#[cfg(feature = "web")]
mod response {
    use axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    use log::error;
    use serde::Serialize;

    use super::Error;

    #[derive(Serialize)]
    struct ErrorBody {
        detail: String,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> Response {
            let status = if self.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            error!("request failed ({}): {}", status.as_u16(), self);

            (
                status,
                Json(ErrorBody {
                    detail: self.to_string(),
                }),
            )
                .into_response()
        }
    }
}
