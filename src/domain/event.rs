use crate::error::{PaymentError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque per-user key supplied by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single user input, already stripped of transport details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `/start`, `/payment` or the main-menu button.
    StartPayment,
    /// The "enter your own amount" button.
    RequestCustomAmount,
    /// A preset amount button; carries the raw button value.
    PresetAmount(String),
    /// Free text. Its meaning depends on the current state.
    Text(String),
    /// A service button; carries the service key (including the synthetic keys).
    SelectService(String),
    Confirm,
    Back,
    Cancel,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::StartPayment => "start payment",
            Event::RequestCustomAmount => "custom amount request",
            Event::PresetAmount(_) => "amount selection",
            Event::Text(_) => "text",
            Event::SelectService(_) => "service selection",
            Event::Confirm => "confirm",
            Event::Back => "back",
            Event::Cancel => "cancel",
        }
    }

    /// Decodes inline-button callback data.
    pub fn from_callback(data: &str) -> Result<Self> {
        let event = match data {
            callback::CUSTOM_AMOUNT => Event::RequestCustomAmount,
            callback::CONFIRM => Event::Confirm,
            callback::CANCEL => Event::Cancel,
            callback::BACK_TO_AMOUNT | callback::BACK_TO_SERVICE => Event::Back,
            _ => {
                if let Some(value) = data.strip_prefix(callback::AMOUNT_PREFIX) {
                    Event::PresetAmount(value.to_string())
                } else if let Some(key) = data.strip_prefix(callback::SERVICE_PREFIX) {
                    Event::SelectService(key.to_string())
                } else {
                    return Err(PaymentError::UnknownCallback(data.to_string()));
                }
            }
        };
        Ok(event)
    }
}

/// Inline-button callback data.
pub mod callback {
    pub const AMOUNT_PREFIX: &str = "amount_";
    pub const SERVICE_PREFIX: &str = "service_";
    pub const CUSTOM_AMOUNT: &str = "amount_custom";
    pub const CONFIRM: &str = "confirm_payment";
    pub const CANCEL: &str = "cancel_payment";
    pub const BACK_TO_AMOUNT: &str = "back_to_amount";
    pub const BACK_TO_SERVICE: &str = "back_to_service";
    /// Telegram drops buttons whose callback data exceeds this many bytes.
    pub const MAX_BYTES: usize = 64;

    pub fn amount(value: impl std::fmt::Display) -> String {
        format!("{AMOUNT_PREFIX}{value}")
    }

    pub fn service(key: &str) -> String {
        format!("{SERVICE_PREFIX}{key}")
    }
}
