use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Unknown product family: {0}")]
    UnknownFamily(String),

    #[error("Invalid rule for family '{family}': {details}")]
    InvalidRule { family: String, details: String },

    #[error("Viewer is not permitted to see revenue measures")]
    RevenueNotPermitted,

    #[error("Invoice {invoice_no} totals do not match line items: declared {declared}, computed {computed}")]
    TotalsMismatch {
        invoice_no: String,
        declared: f64,
        computed: f64,
    },

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
