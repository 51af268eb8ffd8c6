use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("XML write error: {0}")]
    XmlWrite(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Structural problem in a report or fixed-layout document.
    #[error("invalid report: {0}")]
    InvalidReport(String),

    /// Connection, provider or query failure; aborts pagination.
    #[error("database error: {0}")]
    Database(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("unsupported output type: {0}")]
    UnsupportedOutput(String),
}

pub(crate) fn xml_write_err<E: std::fmt::Display>(e: E) -> Error {
    Error::XmlWrite(e.to_string())
}
