use crate::domain::event::UserId;
use crate::domain::ports::{IssuedPayment, PaymentLog, SessionStore};
use crate::domain::session::PaymentSession;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for payment sessions.
///
/// Uses `Arc<RwLock<HashMap<UserId, PaymentSession>>>`. Sessions are keyed per user and
/// never read across keys. Idle sessions are not kept.
#[derive(Default, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<UserId, PaymentSession>>>,
}

impl InMemorySessionStore {
    /// Creates a new, empty in-memory session store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with a conversation in progress.
    pub async fn active(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, user: UserId) -> Result<PaymentSession> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&user).cloned().unwrap_or_default())
    }

    async fn save(&self, user: UserId, session: PaymentSession) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if session.is_idle() {
            sessions.remove(&user);
        } else {
            sessions.insert(user, session);
        }
        Ok(())
    }

    async fn clear(&self, user: UserId) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&user);
        Ok(())
    }
}

/// An in-memory log of issued payments, kept in issue order.
#[derive(Default, Clone)]
pub struct InMemoryPaymentLog {
    payments: Arc<RwLock<Vec<IssuedPayment>>>,
}

impl InMemoryPaymentLog {
    /// Creates a new, empty in-memory payment log.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentLog for InMemoryPaymentLog {
    async fn append(&self, payment: IssuedPayment) -> Result<()> {
        let mut payments = self.payments.write().await;
        payments.push(payment);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<IssuedPayment>> {
        let payments = self.payments.read().await;
        Ok(payments.clone())
    }
}
