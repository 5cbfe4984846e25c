use super::amount::Amount;
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;

/// Longest `MSG` value SPD readers accept.
pub const MAX_MESSAGE_CHARS: usize = 60;

pub const CURRENCY: &str = "CZK";

/// The receiving account embedded in every payment code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beneficiary {
    pub iban: String,
    pub owner_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentPayload {
    pub amount: Amount,
    pub message: Option<String>,
}

impl PaymentPayload {
    pub fn new(amount: Amount, message: Option<String>) -> Result<Self> {
        let message = message.filter(|m| !m.trim().is_empty());
        if let Some(msg) = &message {
            if msg.contains('*') {
                return Err(PaymentError::Payload(
                    "message contains the field separator '*'".to_string(),
                ));
            }
            if msg.chars().count() > MAX_MESSAGE_CHARS {
                return Err(PaymentError::Payload(format!(
                    "message exceeds {MAX_MESSAGE_CHARS} characters"
                )));
            }
        }
        Ok(Self { amount, message })
    }

    /// Builds a payload from an unchecked decimal, applying the amount rules first.
    pub fn from_decimal(amount: Decimal, message: Option<String>) -> Result<Self> {
        Self::new(Amount::new(amount)?, message)
    }
}

/// Renders payloads into the Short Payment Descriptor string bank apps scan.
///
/// `SPD*1.0*ACC:<iban>*RN:<NAME>*AM:<amount>*CC:CZK[*MSG:<text>]`
#[derive(Debug, Clone)]
pub struct SpdEncoder {
    beneficiary: Beneficiary,
}

impl SpdEncoder {
    pub fn new(beneficiary: Beneficiary) -> Self {
        Self { beneficiary }
    }

    pub fn beneficiary(&self) -> &Beneficiary {
        &self.beneficiary
    }

    pub fn encode(&self, payload: &PaymentPayload) -> String {
        let mut spd = format!(
            "SPD*1.0*ACC:{}*RN:{}*AM:{}*CC:{}",
            self.beneficiary.iban,
            self.beneficiary.owner_name.to_uppercase(),
            payload.amount.to_spd(),
            CURRENCY
        );
        if let Some(message) = &payload.message {
            spd.push_str("*MSG:");
            spd.push_str(message);
        }
        spd
    }
}

/// Reads the `AM` field back out of an SPD string.
pub fn spd_amount(spd: &str) -> Option<Amount> {
    spd.split('*')
        .find_map(|field| field.strip_prefix("AM:"))
        .and_then(|raw| Amount::parse(raw).ok())
}
