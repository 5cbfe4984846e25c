use super::amount::Amount;
use super::event::Event;
use super::service::{
    CUSTOM_SERVICE_KEY, NO_SERVICE_KEY, PriceBracket, ServiceCatalog, ServiceChoice,
    ServiceSelection,
};
use crate::error::{PaymentError, Result};

/// Where a user is in the payment conversation.
///
/// Data only lives in the states that need it, so a service can never be chosen
/// before an amount exists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingAmount {
        /// Set after the "enter your own amount" button; only changes the prompt wording.
        custom_entry: bool,
    },
    AwaitingService {
        amount: Amount,
    },
    AwaitingCustomServiceText {
        amount: Amount,
    },
    Confirming {
        amount: Amount,
        selection: ServiceSelection,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingAmount { .. } => "awaiting amount",
            SessionState::AwaitingService { .. } => "awaiting service",
            SessionState::AwaitingCustomServiceText { .. } => "awaiting custom service text",
            SessionState::Confirming { .. } => "confirming",
        }
    }
}

/// Per-user conversational state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaymentSession {
    pub state: SessionState,
}

/// Everything needed to issue one payment code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOrder {
    pub amount: Amount,
    pub selection: ServiceSelection,
}

/// What the machine has to do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    AskAmount,
    AskCustomAmount,
    AskService {
        amount: Amount,
        choices: Vec<ServiceChoice>,
    },
    AskCustomServiceText {
        amount: Amount,
    },
    AskConfirmation {
        amount: Amount,
        selection: ServiceSelection,
    },
    Emit(PaymentOrder),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: PaymentSession,
    pub effect: Effect,
}

impl Transition {
    fn to(state: SessionState, effect: Effect) -> Self {
        Self {
            next: PaymentSession { state },
            effect,
        }
    }
}

impl PaymentSession {
    pub fn new(state: SessionState) -> Self {
        Self { state }
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    pub fn amount(&self) -> Option<Amount> {
        match &self.state {
            SessionState::AwaitingService { amount }
            | SessionState::AwaitingCustomServiceText { amount }
            | SessionState::Confirming { amount, .. } => Some(*amount),
            _ => None,
        }
    }

    pub fn service_text(&self) -> Option<&str> {
        match &self.state {
            SessionState::Confirming { selection, .. } => selection.wire_text.as_deref(),
            _ => None,
        }
    }

    pub fn service_display_label(&self) -> Option<&str> {
        match &self.state {
            SessionState::Confirming { selection, .. } => selection.display_label.as_deref(),
            _ => None,
        }
    }

    /// Computes the next session and its side effect. Never mutates `self`; on error the
    /// caller keeps the current session.
    pub fn apply(&self, event: Event, catalog: &ServiceCatalog) -> Result<Transition> {
        use SessionState::*;

        match (&self.state, event) {
            (_, Event::StartPayment) => Ok(Transition::to(
                AwaitingAmount {
                    custom_entry: false,
                },
                Effect::AskAmount,
            )),
            (Idle, Event::Cancel) => Err(out_of_order(&self.state, &Event::Cancel)),
            (_, Event::Cancel) => Ok(Transition::to(Idle, Effect::Cancelled)),

            (AwaitingAmount { .. }, Event::RequestCustomAmount) => Ok(Transition::to(
                AwaitingAmount { custom_entry: true },
                Effect::AskCustomAmount,
            )),
            (AwaitingAmount { .. }, Event::PresetAmount(raw) | Event::Text(raw)) => {
                let amount = Amount::parse(&raw)?;
                Ok(offer_services(amount, catalog))
            }

            (AwaitingService { amount }, Event::SelectService(key)) => {
                select_service(*amount, &key, catalog)
            }
            (AwaitingService { .. }, Event::Back) => Ok(Transition::to(
                AwaitingAmount {
                    custom_entry: false,
                },
                Effect::AskAmount,
            )),

            (AwaitingCustomServiceText { amount }, Event::Text(raw)) => {
                let selection = ServiceSelection::custom(&raw)?;
                Ok(Transition::to(
                    Idle,
                    Effect::Emit(PaymentOrder {
                        amount: *amount,
                        selection,
                    }),
                ))
            }
            (AwaitingCustomServiceText { amount }, Event::Back) => {
                Ok(offer_services(*amount, catalog))
            }

            (Confirming { amount, selection }, Event::Confirm) => Ok(Transition::to(
                Idle,
                Effect::Emit(PaymentOrder {
                    amount: *amount,
                    selection: selection.clone(),
                }),
            )),
            (Confirming { amount, .. }, Event::Back) => Ok(offer_services(*amount, catalog)),

            (state, event) => Err(out_of_order(state, &event)),
        }
    }
}

fn out_of_order(state: &SessionState, event: &Event) -> PaymentError {
    PaymentError::OutOfOrder {
        state: state.name(),
        event: event.name(),
    }
}

fn offer_services(amount: Amount, catalog: &ServiceCatalog) -> Transition {
    Transition::to(
        SessionState::AwaitingService { amount },
        Effect::AskService {
            amount,
            choices: catalog.list_services_for(amount),
        },
    )
}

fn select_service(amount: Amount, key: &str, catalog: &ServiceCatalog) -> Result<Transition> {
    let selection = match key {
        CUSTOM_SERVICE_KEY => {
            return Ok(Transition::to(
                SessionState::AwaitingCustomServiceText { amount },
                Effect::AskCustomServiceText { amount },
            ));
        }
        NO_SERVICE_KEY => ServiceSelection::none(),
        key => {
            let service = catalog.resolve(key)?;
            if service.bracket != PriceBracket::for_amount(amount) {
                return Err(PaymentError::ServiceNotOffered {
                    key: key.to_string(),
                    amount: amount.to_string(),
                });
            }
            ServiceSelection::from_service(service)
        }
    };

    Ok(Transition::to(
        SessionState::Confirming {
            amount,
            selection: selection.clone(),
        },
        Effect::AskConfirmation { amount, selection },
    ))
}
