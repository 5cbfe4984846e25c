use super::amount::Amount;
use super::event::callback;
use super::payload::MAX_MESSAGE_CHARS;
use crate::error::{PaymentError, Result};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Callback key of the synthetic "type your own service" choice.
pub const CUSTOM_SERVICE_KEY: &str = "custom";
/// Callback key of the synthetic "no service specified" choice.
pub const NO_SERVICE_KEY: &str = "none";

pub const CUSTOM_TEXT_MIN_CHARS: usize = 2;
pub const CUSTOM_TEXT_MAX_CHARS: usize = 50;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceTextError {
    #[error("Service text is too short (minimum 2 characters)")]
    TooShort,
    #[error("Service text is too long (maximum 50 characters)")]
    TooLong,
    #[error("Service text may not contain '{0}'")]
    ForbiddenCharacter(char),
}

/// Which price range a service belongs to.
///
/// Amounts up to and including 1000 CZK offer the low bracket, anything above the high one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceBracket {
    Low,
    High,
}

impl PriceBracket {
    pub fn for_amount(amount: Amount) -> Self {
        if amount.value() <= dec!(1000) {
            PriceBracket::Low
        } else {
            PriceBracket::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub key: String,
    pub display_label: String,
    pub wire_text: String,
    pub bracket: PriceBracket,
}

impl ServiceDefinition {
    pub fn new(key: impl Into<String>, display_label: impl Into<String>, bracket: PriceBracket) -> Self {
        let display_label = display_label.into();
        Self {
            key: key.into(),
            wire_text: wire_text(&display_label),
            display_label,
            bracket,
        }
    }
}

/// One entry of the service menu shown after an amount is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceChoice {
    Catalog(ServiceDefinition),
    CustomText,
    NoService,
}

impl ServiceChoice {
    pub fn key(&self) -> &str {
        match self {
            ServiceChoice::Catalog(service) => &service.key,
            ServiceChoice::CustomText => CUSTOM_SERVICE_KEY,
            ServiceChoice::NoService => NO_SERVICE_KEY,
        }
    }
}

/// What ends up in the payment: the `MSG` text (if any) and the label staff saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSelection {
    pub wire_text: Option<String>,
    pub display_label: Option<String>,
}

impl ServiceSelection {
    pub fn none() -> Self {
        Self {
            wire_text: None,
            display_label: None,
        }
    }

    pub fn from_service(service: &ServiceDefinition) -> Self {
        Self {
            wire_text: Some(service.wire_text.clone()),
            display_label: Some(service.display_label.clone()),
        }
    }

    /// Validates free text typed by staff: trimmed, 2..=50 characters, upper-cased.
    pub fn custom(raw: &str) -> std::result::Result<Self, ServiceTextError> {
        let text = raw.trim();
        if let Some(c) = text.chars().find(|c| *c == '*') {
            return Err(ServiceTextError::ForbiddenCharacter(c));
        }
        let length = text.chars().count();
        if length < CUSTOM_TEXT_MIN_CHARS {
            return Err(ServiceTextError::TooShort);
        }
        if length > CUSTOM_TEXT_MAX_CHARS {
            return Err(ServiceTextError::TooLong);
        }
        let upper = text.to_uppercase();
        Ok(Self {
            wire_text: Some(upper.clone()),
            display_label: Some(upper),
        })
    }
}

/// Strips a leading category marker such as an emoji and upper-cases the rest.
///
/// `"👁️ LAMINACE ŘAS"` becomes `"LAMINACE ŘAS"`; a label without a marker is kept whole.
pub fn wire_text(label: &str) -> String {
    let label = label.trim();
    let stripped = match label.split_once(char::is_whitespace) {
        Some((first, rest)) if !first.chars().any(char::is_alphanumeric) => rest.trim_start(),
        _ => label,
    };
    stripped.to_uppercase()
}

/// The static list of sellable services, loaded once at startup.
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    services: Vec<ServiceDefinition>,
}

impl ServiceCatalog {
    pub fn new(services: Vec<ServiceDefinition>) -> Result<Self> {
        if services.is_empty() {
            return Err(PaymentError::Config("service catalog is empty".to_string()));
        }
        for (i, service) in services.iter().enumerate() {
            if service.key == CUSTOM_SERVICE_KEY || service.key == NO_SERVICE_KEY {
                return Err(PaymentError::Config(format!(
                    "service key '{}' is reserved",
                    service.key
                )));
            }
            if service.key.is_empty() || callback::service(&service.key).len() > callback::MAX_BYTES {
                return Err(PaymentError::Config(format!(
                    "service key '{}' does not fit into button data",
                    service.key
                )));
            }
            if !service.wire_text.chars().any(char::is_alphanumeric)
                || service.wire_text.contains('*')
                || service.wire_text.chars().count() > MAX_MESSAGE_CHARS
            {
                return Err(PaymentError::Config(format!(
                    "service '{}' has no usable payment text",
                    service.key
                )));
            }
            if services[..i].iter().any(|other| other.key == service.key) {
                return Err(PaymentError::Config(format!(
                    "duplicate service key '{}'",
                    service.key
                )));
            }
        }
        Ok(Self { services })
    }

    /// The salon's own service list.
    pub fn salon_default() -> Self {
        use PriceBracket::{High, Low};
        let services = [
            ("uprava", "🌿 ÚPRAVA", Low),
            ("uprava_barveni", "🌿 ÚPRAVA A BARVENÍ", Low),
            ("barveni_ras", "👁️ BARVENÍ ŘAS", Low),
            ("depilace_obliceje", "🌿 DEPILACE OBLIČEJE", Low),
            ("liceni", "👄 LÍČENÍ", Low),
            ("uces", "👄 ÚČES", Low),
            ("zesvetleni_uprava_tonovani", "🌿 ZESVĚTLENÍ S ÚPRAVOU A TONOVÁNÍM", High),
            ("laminace_uprava_tonovani", "🌿 LAMINACE S ÚPRAVOU A TONOVÁNÍM", High),
            ("laminace_ras", "👁️ LAMINACE ŘAS", High),
            ("laminace_ras_uprava_barveni", "✨ LAMINACE ŘAS + ÚPRAVA A BARVENÍ OBOČÍ", High),
            ("laminace_ras_zesvetleni", "✨ LAMINACE ŘAS + ZESVĚTLENÍ OBOČÍ S TÓNOVÁNÍM", High),
            ("laminace_oboci_ras", "✨ LAMINACE OBOČÍ A ŘAS", High),
            ("liceni_uces", "👄 LÍČENÍ & ÚČES", High),
        ];
        Self {
            services: services
                .into_iter()
                .map(|(key, label, bracket)| ServiceDefinition::new(key, label, bracket))
                .collect(),
        }
    }

    pub fn services(&self) -> &[ServiceDefinition] {
        &self.services
    }

    /// Services offerable for `amount`, followed by the custom-text and no-service choices.
    pub fn list_services_for(&self, amount: Amount) -> Vec<ServiceChoice> {
        let bracket = PriceBracket::for_amount(amount);
        self.services
            .iter()
            .filter(|service| service.bracket == bracket)
            .cloned()
            .map(ServiceChoice::Catalog)
            .chain([ServiceChoice::CustomText, ServiceChoice::NoService])
            .collect()
    }

    pub fn resolve(&self, key: &str) -> Result<&ServiceDefinition> {
        self.services
            .iter()
            .find(|service| service.key == key)
            .ok_or_else(|| PaymentError::UnknownService(key.to_string()))
    }
}
