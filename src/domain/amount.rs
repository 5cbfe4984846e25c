use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest amount a single payment code may request.
pub const MAX_AMOUNT: Decimal = dec!(1000000);

/// Maximum number of fractional digits (haléře).
pub const MAX_DECIMALS: u32 = 2;

/// Digits in the integer part of [`MAX_AMOUNT`].
const MAX_WHOLE_DIGITS: usize = 7;

/// Currency markers staff tend to type after the number.
const CURRENCY_MARKERS: [&str; 5] = ["czk", "kč", "kc", ",-", ".-"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("Amount must be greater than zero")]
    NonPositive,
    #[error("Amount must not exceed 1,000,000")]
    TooLarge,
    #[error("Amount may have at most two decimal places")]
    TooManyDecimals,
}

/// A validated payment amount in CZK.
///
/// Always positive, at most [`MAX_AMOUNT`] and with no more than [`MAX_DECIMALS`]
/// fractional digits. The only way to obtain one is through validation, so holders
/// never need to re-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NonPositive);
        }
        if value > MAX_AMOUNT {
            return Err(AmountError::TooLarge);
        }
        if value.normalize().scale() > MAX_DECIMALS {
            return Err(AmountError::TooManyDecimals);
        }
        Ok(Self(value.normalize()))
    }

    /// Parses free text such as `"1 250,50 Kč"` or a preset button value such as `"1500"`.
    pub fn parse(raw: &str) -> Result<Self, AmountError> {
        let normalized = normalize(raw);
        let not_a_number = || AmountError::NotANumber(raw.trim().to_string());

        let (negative, unsigned) = match normalized.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, normalized.strip_prefix('+').unwrap_or(&normalized)),
        };
        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let digits_only = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !digits_only(whole) || !digits_only(fraction)
        {
            return Err(not_a_number());
        }

        // Limits are checked on the text: Decimal silently rounds past 28 digits.
        let whole = whole.trim_start_matches('0');
        let fraction = fraction.trim_end_matches('0');
        if negative || (whole.is_empty() && fraction.is_empty()) {
            return Err(AmountError::NonPositive);
        }
        if whole.len() > MAX_WHOLE_DIGITS {
            return Err(AmountError::TooLarge);
        }
        if fraction.len() > MAX_DECIMALS as usize {
            return Err(AmountError::TooManyDecimals);
        }

        let canonical = format!(
            "{}.{}",
            if whole.is_empty() { "0" } else { whole },
            if fraction.is_empty() { "0" } else { fraction }
        );
        let value = Decimal::from_str(&canonical).map_err(|_| not_a_number())?;
        Self::new(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_whole(&self) -> bool {
        self.0.fract().is_zero()
    }

    /// Renders the amount the way SPD readers expect it in the `AM` field:
    /// `1500` for whole amounts, `1500,50` otherwise.
    pub fn to_spd(&self) -> String {
        if self.is_whole() {
            self.0.trunc().normalize().to_string()
        } else {
            let mut cents = self.0.round_dp(MAX_DECIMALS);
            cents.rescale(MAX_DECIMALS);
            cents.to_string().replace('.', ",")
        }
    }

    /// Human-facing rendering with a space as thousands separator, e.g. `1 234,50`.
    pub fn to_czech(&self) -> String {
        let mut cents = self.0;
        cents.rescale(MAX_DECIMALS);
        let text = cents.to_string();
        let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(' ');
            }
            grouped.push(digit);
        }
        format!("{grouped},{fraction}")
    }
}

fn normalize(raw: &str) -> String {
    let mut text = raw.trim().to_lowercase();
    for marker in CURRENCY_MARKERS {
        if let Some(stripped) = text.strip_suffix(marker) {
            text = stripped.trim_end().to_string();
        }
    }
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect()
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} CZK", self.to_czech())
    }
}
