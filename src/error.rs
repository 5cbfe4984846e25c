use crate::domain::amount::AmountError;
use crate::domain::service::ServiceTextError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

/// How an error affects the payment conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad user input. The same state re-prompts and the session is untouched.
    Input,
    /// An event arrived in a state that does not accept it. The session is untouched.
    Sequencing,
    /// Building, rendering or delivering the QR code failed. The session resets to idle.
    Emission,
    /// Storage, transport or configuration failures outside the conversation.
    Infrastructure,
}

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error(transparent)]
    Amount(#[from] AmountError),
    #[error("Unknown service: {0}")]
    UnknownService(String),
    #[error("Service '{key}' is not offered for {amount}")]
    ServiceNotOffered { key: String, amount: String },
    #[error(transparent)]
    ServiceText(#[from] ServiceTextError),
    #[error("Event '{event}' is not accepted while {state}")]
    OutOfOrder {
        state: &'static str,
        event: &'static str,
    },
    #[error("Unrecognised callback data: {0}")]
    UnknownCallback(String),
    #[error("Payload error: {0}")]
    Payload(String),
    #[error("QR rendering error: {0}")]
    Render(String),
    #[error("Delivery error: {0}")]
    Delivery(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl PaymentError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PaymentError::Amount(_)
            | PaymentError::UnknownService(_)
            | PaymentError::ServiceNotOffered { .. }
            | PaymentError::ServiceText(_) => ErrorClass::Input,
            PaymentError::OutOfOrder { .. } | PaymentError::UnknownCallback(_) => {
                ErrorClass::Sequencing
            }
            PaymentError::Payload(_) | PaymentError::Render(_) | PaymentError::Delivery(_) => {
                ErrorClass::Emission
            }
            _ => ErrorClass::Infrastructure,
        }
    }

    /// Input and sequencing errors are answered with a re-prompt and leave the session as it was.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.class(), ErrorClass::Input | ErrorClass::Sequencing)
    }
}
