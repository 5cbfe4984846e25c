use async_trait::async_trait;
use salon_qr::application::machine::{Outcome, PaymentSessionMachine};
use salon_qr::application::messages;
use salon_qr::config::AccountConfig;
use salon_qr::domain::amount::{Amount, AmountError};
use salon_qr::domain::event::{Event, UserId, callback};
use salon_qr::domain::ports::{Markup, Messenger, PaymentLog, QrRenderer};
use salon_qr::domain::service::{ServiceCatalog, ServiceTextError};
use salon_qr::domain::session::SessionState;
use salon_qr::error::{PaymentError, Result};
use salon_qr::infrastructure::in_memory::{InMemoryPaymentLog, InMemorySessionStore};
use salon_qr::infrastructure::qr::PngQrRenderer;
use std::sync::{Arc, Mutex};

const IBAN: &str = "CZ3230300000003247217010";

#[derive(Default, Clone)]
struct Chat {
    texts: Arc<Mutex<Vec<(UserId, String)>>>,
    images: Arc<Mutex<Vec<(UserId, Vec<u8>)>>>,
    refuse_images: bool,
}

impl Chat {
    fn last_text(&self) -> String {
        self.texts.lock().unwrap().last().unwrap().1.clone()
    }

    fn image_count(&self) -> usize {
        self.images.lock().unwrap().len()
    }
}

#[async_trait]
impl Messenger for Chat {
    async fn send_text(&self, user: UserId, text: String, _: Option<Markup>) -> Result<()> {
        self.texts.lock().unwrap().push((user, text));
        Ok(())
    }

    async fn send_image(&self, user: UserId, png: Vec<u8>, _: String) -> Result<()> {
        if self.refuse_images {
            return Err(PaymentError::Delivery("chat not found".to_string()));
        }
        self.images.lock().unwrap().push((user, png));
        Ok(())
    }
}

struct BrokenRenderer;

impl QrRenderer for BrokenRenderer {
    fn render(&self, _: &str) -> Result<Vec<u8>> {
        Err(PaymentError::Render("data too long".to_string()))
    }
}

struct Harness {
    machine: PaymentSessionMachine,
    chat: Chat,
    log: InMemoryPaymentLog,
}

fn harness_with(chat: Chat, renderer: Box<dyn QrRenderer>) -> Harness {
    let log = InMemoryPaymentLog::new();
    let machine = PaymentSessionMachine::new(
        AccountConfig::new("Uliana Emelina", IBAN, "3247217010/3030").unwrap(),
        ServiceCatalog::salon_default(),
        Box::new(InMemorySessionStore::new()),
        renderer,
        Box::new(chat.clone()),
        Box::new(log.clone()),
    );
    Harness { machine, chat, log }
}

fn harness() -> Harness {
    harness_with(Chat::default(), Box::new(PngQrRenderer::new()))
}

async fn state(h: &Harness, user: UserId) -> SessionState {
    h.machine.session(user).await.unwrap().state
}

async fn press(h: &Harness, user: UserId, data: &str) -> Outcome {
    let event = Event::from_callback(data).unwrap();
    h.machine.handle(user, event).await.unwrap()
}

#[tokio::test]
async fn test_happy_path_emits_once() {
    let h = harness();
    let user = UserId(42);

    h.machine.handle(user, Event::StartPayment).await.unwrap();
    let outcome = h.machine.handle(user, Event::Text("800".into())).await.unwrap();
    let amount = Amount::parse("800").unwrap();
    assert!(matches!(outcome, Outcome::Advanced(SessionState::AwaitingService { amount: a }) if a == amount));

    let outcome = press(&h, user, &callback::service("uprava")).await;
    assert!(matches!(outcome, Outcome::Advanced(SessionState::Confirming { .. })));

    let outcome = press(&h, user, callback::CONFIRM).await;
    let Outcome::Emitted(payment) = outcome else {
        panic!("expected emission, got {outcome:?}");
    };
    assert_eq!(
        payment.payload,
        format!("SPD*1.0*ACC:{IBAN}*RN:ULIANA EMELINA*AM:800*CC:CZK*MSG:ÚPRAVA")
    );
    assert_eq!(payment.service_text.as_deref(), Some("ÚPRAVA"));
    assert_eq!(h.chat.image_count(), 1);
    assert_eq!(h.log.all().await.unwrap().len(), 1);
    assert_eq!(state(&h, user).await, SessionState::Idle);

    // A second confirm has nothing to confirm.
    let outcome = press(&h, user, callback::CONFIRM).await;
    assert!(matches!(outcome, Outcome::Rejected(PaymentError::OutOfOrder { .. })));
    assert_eq!(h.chat.image_count(), 1);
}

#[tokio::test]
async fn test_service_selection_before_amount_is_rejected() {
    let h = harness();
    let user = UserId(1);

    h.machine.handle(user, Event::StartPayment).await.unwrap();
    let outcome = press(&h, user, &callback::service("uprava")).await;

    assert!(matches!(outcome, Outcome::Rejected(PaymentError::OutOfOrder { .. })));
    assert_eq!(
        state(&h, user).await,
        SessionState::AwaitingAmount {
            custom_entry: false
        }
    );
}

#[tokio::test]
async fn test_custom_service_text_length() {
    let h = harness();
    let user = UserId(7);

    h.machine.handle(user, Event::StartPayment).await.unwrap();
    press(&h, user, &callback::amount(1500)).await;
    let outcome = press(&h, user, &callback::service("custom")).await;
    assert!(matches!(outcome, Outcome::Advanced(SessionState::AwaitingCustomServiceText { .. })));

    let outcome = h.machine.handle(user, Event::Text("x".into())).await.unwrap();
    assert!(matches!(
        outcome,
        Outcome::Rejected(PaymentError::ServiceText(ServiceTextError::TooShort))
    ));

    let outcome = h.machine.handle(user, Event::Text("x".repeat(51))).await.unwrap();
    assert!(matches!(
        outcome,
        Outcome::Rejected(PaymentError::ServiceText(ServiceTextError::TooLong))
    ));
    assert!(matches!(state(&h, user).await, SessionState::AwaitingCustomServiceText { .. }));

    let outcome = h.machine.handle(user, Event::Text("ab".into())).await.unwrap();
    let Outcome::Emitted(payment) = outcome else {
        panic!("expected emission, got {outcome:?}");
    };
    assert!(payment.payload.ends_with("*AM:1500*CC:CZK*MSG:AB"));
    assert_eq!(state(&h, user).await, SessionState::Idle);

    h.machine.handle(user, Event::StartPayment).await.unwrap();
    press(&h, user, &callback::amount(1500)).await;
    press(&h, user, &callback::service("custom")).await;
    let outcome = h.machine.handle(user, Event::Text("y".repeat(50))).await.unwrap();
    assert!(matches!(outcome, Outcome::Emitted(_)));
}

#[tokio::test]
async fn test_service_outside_price_bracket_is_rejected() {
    let h = harness();
    let user = UserId(3);

    h.machine.handle(user, Event::StartPayment).await.unwrap();
    press(&h, user, &callback::amount(500)).await;
    let outcome = press(&h, user, &callback::service("laminace_ras")).await;

    assert!(matches!(outcome, Outcome::Rejected(PaymentError::ServiceNotOffered { .. })));
    assert!(matches!(state(&h, user).await, SessionState::AwaitingService { .. }));
}

#[tokio::test]
async fn test_invalid_amount_keeps_waiting() {
    let h = harness();
    let user = UserId(9);

    h.machine.handle(user, Event::StartPayment).await.unwrap();
    press(&h, user, callback::CUSTOM_AMOUNT).await;

    for (input, expected) in [
        ("abc", AmountError::NotANumber("abc".into())),
        ("0", AmountError::NonPositive),
        ("2000000", AmountError::TooLarge),
        ("10.555", AmountError::TooManyDecimals),
    ] {
        let outcome = h.machine.handle(user, Event::Text(input.into())).await.unwrap();
        match outcome {
            Outcome::Rejected(PaymentError::Amount(error)) => assert_eq!(error, expected),
            other => panic!("{input}: unexpected {other:?}"),
        }
        assert_eq!(
            state(&h, user).await,
            SessionState::AwaitingAmount { custom_entry: true }
        );
    }
}

#[tokio::test]
async fn test_no_service_goes_through_confirmation() {
    let h = harness();
    let user = UserId(11);

    h.machine.handle(user, Event::StartPayment).await.unwrap();
    press(&h, user, &callback::amount(1500)).await;
    let outcome = press(&h, user, &callback::service("none")).await;
    assert!(matches!(outcome, Outcome::Advanced(SessionState::Confirming { .. })));

    let Outcome::Emitted(payment) = press(&h, user, callback::CONFIRM).await else {
        panic!("expected emission");
    };
    assert_eq!(
        payment.payload,
        format!("SPD*1.0*ACC:{IBAN}*RN:ULIANA EMELINA*AM:1500*CC:CZK")
    );
    assert_eq!(payment.service_text, None);
}

#[tokio::test]
async fn test_back_navigation() {
    let h = harness();
    let user = UserId(12);

    h.machine.handle(user, Event::StartPayment).await.unwrap();
    press(&h, user, &callback::amount(1500)).await;
    press(&h, user, &callback::service("laminace_ras")).await;
    assert!(matches!(state(&h, user).await, SessionState::Confirming { .. }));

    press(&h, user, callback::BACK_TO_SERVICE).await;
    assert!(matches!(state(&h, user).await, SessionState::AwaitingService { .. }));

    press(&h, user, callback::BACK_TO_AMOUNT).await;
    assert_eq!(
        state(&h, user).await,
        SessionState::AwaitingAmount {
            custom_entry: false
        }
    );
}

#[tokio::test]
async fn test_cancel() {
    let h = harness();
    let user = UserId(13);

    let outcome = h.machine.handle(user, Event::Cancel).await.unwrap();
    assert!(matches!(outcome, Outcome::Rejected(PaymentError::OutOfOrder { .. })));

    h.machine.handle(user, Event::StartPayment).await.unwrap();
    press(&h, user, &callback::amount(900)).await;
    let outcome = press(&h, user, callback::CANCEL).await;

    assert!(matches!(outcome, Outcome::Cancelled));
    assert_eq!(h.chat.last_text(), messages::cancelled());
    assert_eq!(state(&h, user).await, SessionState::Idle);
    assert_eq!(h.chat.image_count(), 0);
}

#[tokio::test]
async fn test_restart_discards_progress() {
    let h = harness();
    let user = UserId(14);

    h.machine.handle(user, Event::StartPayment).await.unwrap();
    press(&h, user, &callback::amount(1500)).await;
    press(&h, user, &callback::service("none")).await;
    h.machine.handle(user, Event::StartPayment).await.unwrap();

    assert_eq!(
        state(&h, user).await,
        SessionState::AwaitingAmount {
            custom_entry: false
        }
    );
}

#[tokio::test]
async fn test_render_failure_resets_session() {
    let h = harness_with(Chat::default(), Box::new(BrokenRenderer));
    let user = UserId(20);

    h.machine.handle(user, Event::StartPayment).await.unwrap();
    press(&h, user, &callback::amount(1500)).await;
    press(&h, user, &callback::service("none")).await;
    let outcome = press(&h, user, callback::CONFIRM).await;

    assert!(matches!(outcome, Outcome::Failed(PaymentError::Render(_))));
    assert_eq!(state(&h, user).await, SessionState::Idle);
    assert_eq!(h.chat.last_text(), messages::emission_failed());
    assert!(h.log.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delivery_failure_is_not_recorded() {
    let chat = Chat {
        refuse_images: true,
        ..Chat::default()
    };
    let h = harness_with(chat, Box::new(PngQrRenderer::new()));
    let user = UserId(21);

    h.machine.handle(user, Event::StartPayment).await.unwrap();
    press(&h, user, &callback::amount(700)).await;
    press(&h, user, &callback::service("custom")).await;
    let outcome = h.machine.handle(user, Event::Text("brows".into())).await.unwrap();

    assert!(matches!(outcome, Outcome::Failed(PaymentError::Delivery(_))));
    assert_eq!(state(&h, user).await, SessionState::Idle);
    assert!(h.log.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_callback_is_rejected() {
    let h = harness();
    let user = UserId(22);

    h.machine.handle(user, Event::StartPayment).await.unwrap();
    let error = Event::from_callback("pay_now").unwrap_err();
    let outcome = h.machine.reject(user, error).await.unwrap();

    assert!(matches!(outcome, Outcome::Rejected(PaymentError::UnknownCallback(_))));
    assert_eq!(
        state(&h, user).await,
        SessionState::AwaitingAmount {
            custom_entry: false
        }
    );
}

#[tokio::test]
async fn test_sessions_are_isolated_per_user() {
    let h = Arc::new(harness());
    let alice = UserId(100);
    let bob = UserId(200);

    h.machine.handle(alice, Event::StartPayment).await.unwrap();
    h.machine.handle(bob, Event::StartPayment).await.unwrap();
    press(&h, alice, &callback::amount(1500)).await;

    assert!(matches!(state(&h, alice).await, SessionState::AwaitingService { .. }));
    assert_eq!(
        state(&h, bob).await,
        SessionState::AwaitingAmount {
            custom_entry: false
        }
    );

    let mut handles = Vec::new();
    for id in 300..310 {
        let h = Arc::clone(&h);
        handles.push(tokio::spawn(async move {
            let user = UserId(id);
            h.machine.handle(user, Event::StartPayment).await.unwrap();
            h.machine
                .handle(user, Event::Text(format!("{}", 500 + id)))
                .await
                .unwrap();
            h.machine
                .handle(user, Event::SelectService("none".into()))
                .await
                .unwrap();
            h.machine.handle(user, Event::Confirm).await.unwrap()
        }));
    }
    for handle in handles {
        assert!(matches!(handle.await.unwrap(), Outcome::Emitted(_)));
    }

    let payments = h.log.all().await.unwrap();
    assert_eq!(payments.len(), 10);
    for payment in payments {
        assert!(payment.payload.contains(&format!("*AM:{}*", 500 + payment.user_id.0)));
    }
    assert!(matches!(state(&h, alice).await, SessionState::AwaitingService { .. }));
}
