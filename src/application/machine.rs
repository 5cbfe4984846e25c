use super::messages;
use crate::config::AccountConfig;
use crate::domain::event::{Event, UserId};
use crate::domain::payload::{PaymentPayload, SpdEncoder};
use crate::domain::ports::{
    IssuedPayment, Markup, MessengerBox, PaymentLogBox, QrRendererBox, SessionStoreBox,
};
use crate::domain::service::ServiceCatalog;
use crate::domain::session::{Effect, PaymentOrder, PaymentSession, SessionState};
use crate::error::{PaymentError, Result};
use chrono::Utc;
use tracing::{debug, error, info, warn};

/// What handling one event led to.
#[derive(Debug)]
pub enum Outcome {
    /// The event was accepted and the session moved to this state.
    Advanced(SessionState),
    /// Bad input or an event out of order. The user was told why; the session is unchanged.
    Rejected(PaymentError),
    /// The flow was cancelled and the session cleared.
    Cancelled,
    /// A payment code was delivered and the session cleared.
    Emitted(IssuedPayment),
    /// Building or delivering the code failed. The session was reset to idle.
    Failed(PaymentError),
}

/// Drives the per-user payment conversation.
///
/// Owns the session store and all collaborators. Each event is validated by the pure
/// transition function first; nothing is written when it is rejected. Emission never
/// leaves a session behind: success and failure both end idle.
pub struct PaymentSessionMachine {
    account: AccountConfig,
    catalog: ServiceCatalog,
    encoder: SpdEncoder,
    sessions: SessionStoreBox,
    renderer: QrRendererBox,
    messenger: MessengerBox,
    payments: PaymentLogBox,
}

impl PaymentSessionMachine {
    /// Creates a new `PaymentSessionMachine`.
    ///
    /// # Arguments
    ///
    /// * `account` - The receiving account put into every code.
    /// * `catalog` - The services staff can attach to a payment.
    /// * `sessions` - Per-user session storage.
    /// * `renderer` - Turns SPD strings into images.
    /// * `messenger` - Outbound side of the messaging transport.
    /// * `payments` - Sink notified after each successful emission.
    pub fn new(
        account: AccountConfig,
        catalog: ServiceCatalog,
        sessions: SessionStoreBox,
        renderer: QrRendererBox,
        messenger: MessengerBox,
        payments: PaymentLogBox,
    ) -> Self {
        Self {
            encoder: SpdEncoder::new(account.beneficiary()),
            account,
            catalog,
            sessions,
            renderer,
            messenger,
            payments,
        }
    }

    pub fn account(&self) -> &AccountConfig {
        &self.account
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub async fn session(&self, user: UserId) -> Result<PaymentSession> {
        self.sessions.load(user).await
    }

    /// Processes one event for `user` to completion.
    ///
    /// Only infrastructure failures (storage, transport) are returned as `Err`; every
    /// conversational outcome, including emission failures, is an [`Outcome`].
    pub async fn handle(&self, user: UserId, event: Event) -> Result<Outcome> {
        let session = self.sessions.load(user).await?;
        let event_name = event.name();

        let transition = match session.apply(event, &self.catalog) {
            Ok(transition) => transition,
            Err(error) => {
                warn!(%user, state = session.state.name(), event = event_name, %error, "Event rejected");
                return self.reject_in(user, &session, error).await;
            }
        };

        let (text, markup) = match transition.effect {
            Effect::Emit(order) => return self.emit(user, order).await,
            Effect::AskAmount => (messages::amount_prompt(), Some(messages::amount_keyboard())),
            Effect::AskCustomAmount => (messages::custom_amount_prompt(), None),
            Effect::AskService { amount, choices } => (
                messages::service_prompt(amount),
                Some(messages::service_keyboard(&choices)),
            ),
            Effect::AskCustomServiceText { amount } => (
                messages::custom_service_prompt(amount),
                Some(messages::custom_service_keyboard()),
            ),
            Effect::AskConfirmation { amount, selection } => (
                messages::confirmation(amount, &selection, &self.account),
                Some(messages::confirmation_keyboard()),
            ),
            Effect::Cancelled => (messages::cancelled(), Some(Markup::MainMenu)),
        };

        let next = transition.next.state;
        info!(%user, from = session.state.name(), to = next.name(), event = event_name, "Session transition");
        self.sessions.save(user, PaymentSession::new(next.clone())).await?;
        self.messenger.send_text(user, text, markup).await?;

        if next == SessionState::Idle {
            Ok(Outcome::Cancelled)
        } else {
            Ok(Outcome::Advanced(next))
        }
    }

    /// Answers input the transport could not turn into an [`Event`], e.g. stale callback data.
    pub async fn reject(&self, user: UserId, error: PaymentError) -> Result<Outcome> {
        let session = self.sessions.load(user).await?;
        warn!(%user, state = session.state.name(), %error, "Input rejected");
        self.reject_in(user, &session, error).await
    }

    async fn reject_in(
        &self,
        user: UserId,
        session: &PaymentSession,
        error: PaymentError,
    ) -> Result<Outcome> {
        self.messenger
            .send_text(user, messages::rejection(&error), self.reprompt_markup(session))
            .await?;
        Ok(Outcome::Rejected(error))
    }

    pub async fn welcome(&self, user: UserId) -> Result<()> {
        self.messenger
            .send_text(user, messages::welcome(), Some(Markup::MainMenu))
            .await
    }

    pub async fn show_help(&self, user: UserId) -> Result<()> {
        self.messenger
            .send_text(user, messages::help(), Some(Markup::MainMenu))
            .await
    }

    pub async fn show_account_info(&self, user: UserId) -> Result<()> {
        self.messenger
            .send_text(user, messages::account_info(&self.account), Some(Markup::MainMenu))
            .await
    }

    /// Answers a slash command the bot does not know. The session is left as it is.
    pub async fn unknown_command(&self, user: UserId, command: &str) -> Result<()> {
        debug!(%user, command, "Unknown command");
        self.messenger
            .send_text(user, messages::unknown_command(), Some(Markup::MainMenu))
            .await
    }

    async fn emit(&self, user: UserId, order: PaymentOrder) -> Result<Outcome> {
        // Whatever happens next, the session does not outlive this call.
        self.sessions.clear(user).await?;

        match self.issue(user, &order).await {
            Ok(payment) => {
                info!(
                    %user,
                    amount = %payment.amount,
                    service = payment.service_text.as_deref().unwrap_or("-"),
                    "QR code issued"
                );
                if let Err(error) = self.payments.append(payment.clone()).await {
                    warn!(%user, %error, "Failed to record issued payment");
                }
                Ok(Outcome::Emitted(payment))
            }
            Err(error) => {
                error!(%user, %error, "QR code emission failed");
                if let Err(send_error) = self
                    .messenger
                    .send_text(user, messages::emission_failed(), Some(Markup::MainMenu))
                    .await
                {
                    warn!(%user, error = %send_error, "Failed to report emission failure");
                }
                Ok(Outcome::Failed(error))
            }
        }
    }

    async fn issue(&self, user: UserId, order: &PaymentOrder) -> Result<IssuedPayment> {
        let payload = PaymentPayload::new(order.amount, order.selection.wire_text.clone())?;
        let spd = self.encoder.encode(&payload);
        let png = self.renderer.render(&spd)?;
        let caption = messages::qr_caption(order.amount, &order.selection, &self.account);

        self.messenger
            .send_image(user, png, caption)
            .await
            .map_err(|e| match e {
                PaymentError::Delivery(_) => e,
                other => PaymentError::Delivery(other.to_string()),
            })?;

        Ok(IssuedPayment {
            user_id: user,
            amount: order.amount.value(),
            service_text: payload.message,
            payload: spd,
            issued_at: Utc::now(),
        })
    }

    fn reprompt_markup(&self, session: &PaymentSession) -> Option<Markup> {
        match &session.state {
            SessionState::Idle => Some(Markup::MainMenu),
            SessionState::AwaitingAmount {
                custom_entry: false,
            } => Some(messages::amount_keyboard()),
            SessionState::AwaitingAmount { custom_entry: true } => None,
            SessionState::AwaitingService { amount } => Some(messages::service_keyboard(
                &self.catalog.list_services_for(*amount),
            )),
            SessionState::AwaitingCustomServiceText { .. } => {
                Some(messages::custom_service_keyboard())
            }
            SessionState::Confirming { .. } => Some(messages::confirmation_keyboard()),
        }
    }
}
