use crate::domain::payload::{Beneficiary, CURRENCY};
use crate::error::{PaymentError, Result};

/// Receiving-account details, loaded once at startup and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountConfig {
    pub owner_name: String,
    pub iban: String,
    /// Czech domestic account number (`number/bank code`), shown to staff only.
    pub account_number: String,
    pub currency: &'static str,
}

impl AccountConfig {
    pub fn new(owner_name: &str, iban: &str, account_number: &str) -> Result<Self> {
        let owner_name = owner_name.trim();
        if owner_name.is_empty() {
            return Err(PaymentError::Config("owner name is empty".to_string()));
        }
        if owner_name.contains('*') {
            return Err(PaymentError::Config(
                "owner name may not contain '*'".to_string(),
            ));
        }
        let iban = normalize_iban(iban)?;
        Ok(Self {
            owner_name: owner_name.to_string(),
            iban,
            account_number: account_number.trim().to_string(),
            currency: CURRENCY,
        })
    }

    pub fn beneficiary(&self) -> Beneficiary {
        Beneficiary {
            iban: self.iban.clone(),
            owner_name: self.owner_name.clone(),
        }
    }
}

/// Removes spaces, upper-cases and checks the ISO 13616 mod-97 checksum.
pub fn normalize_iban(raw: &str) -> Result<String> {
    let iban: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    let invalid = |reason: &str| PaymentError::Config(format!("invalid IBAN '{raw}': {reason}"));

    if !(15..=34).contains(&iban.len()) {
        return Err(invalid("wrong length"));
    }
    if !iban.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid("unexpected character"));
    }
    if !iban[..2].chars().all(|c| c.is_ascii_alphabetic())
        || !iban[2..4].chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid("must start with a country code and check digits"));
    }

    let rearranged = iban[4..].chars().chain(iban[..4].chars());
    let mut remainder: u32 = 0;
    for c in rearranged {
        let value = c.to_digit(36).ok_or_else(|| invalid("unexpected character"))?;
        remainder = if value < 10 {
            (remainder * 10 + value) % 97
        } else {
            (remainder * 100 + value) % 97
        };
    }
    if remainder != 1 {
        return Err(invalid("checksum mismatch"));
    }
    Ok(iban)
}
