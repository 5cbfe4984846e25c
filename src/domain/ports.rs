use super::event::UserId;
use super::session::PaymentSession;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Keyed storage for conversational sessions. Each user's entry is independent.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the user's session, or an idle one if none is stored.
    async fn load(&self, user: UserId) -> Result<PaymentSession>;
    async fn save(&self, user: UserId, session: PaymentSession) -> Result<()>;
    async fn clear(&self, user: UserId) -> Result<()>;
}

/// A payment code that was delivered to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedPayment {
    pub user_id: UserId,
    pub amount: Decimal,
    pub service_text: Option<String>,
    pub payload: String,
    pub issued_at: DateTime<Utc>,
}

/// Record sink notified after every successful emission.
#[async_trait]
pub trait PaymentLog: Send + Sync {
    async fn append(&self, payment: IssuedPayment) -> Result<()>;
    async fn all(&self) -> Result<Vec<IssuedPayment>>;
}

/// Turns an SPD string into a PNG image.
pub trait QrRenderer: Send + Sync {
    fn render(&self, payload: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub callback: String,
}

impl Button {
    pub fn new(label: impl Into<String>, callback: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback: callback.into(),
        }
    }
}

/// Controls attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    /// Buttons under the message, answered with callback data.
    Inline(Vec<Vec<Button>>),
    /// The persistent main menu.
    MainMenu,
}

/// The outbound half of the messaging transport.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, user: UserId, text: String, markup: Option<Markup>) -> Result<()>;
    async fn send_image(&self, user: UserId, png: Vec<u8>, caption: String) -> Result<()>;
}

pub type SessionStoreBox = Box<dyn SessionStore>;
pub type PaymentLogBox = Box<dyn PaymentLog>;
pub type QrRendererBox = Box<dyn QrRenderer>;
pub type MessengerBox = Box<dyn Messenger>;
