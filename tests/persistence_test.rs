#![cfg(feature = "storage-rocksdb")]

use async_trait::async_trait;
use salon_qr::application::machine::{Outcome, PaymentSessionMachine};
use salon_qr::config::AccountConfig;
use salon_qr::domain::event::{Event, UserId};
use salon_qr::domain::ports::{Markup, Messenger, PaymentLog};
use salon_qr::domain::service::ServiceCatalog;
use salon_qr::error::Result;
use salon_qr::infrastructure::in_memory::InMemorySessionStore;
use salon_qr::infrastructure::qr::PngQrRenderer;
use salon_qr::infrastructure::rocksdb::RocksDbPaymentLog;
use tempfile::tempdir;

struct Silent;

#[async_trait]
impl Messenger for Silent {
    async fn send_text(&self, _: UserId, _: String, _: Option<Markup>) -> Result<()> {
        Ok(())
    }

    async fn send_image(&self, _: UserId, _: Vec<u8>, _: String) -> Result<()> {
        Ok(())
    }
}

async fn issue(log: RocksDbPaymentLog, user: UserId, amount: &str) {
    let machine = PaymentSessionMachine::new(
        AccountConfig::new("Salon", "CZ3230300000003247217010", "3247217010/3030").unwrap(),
        ServiceCatalog::salon_default(),
        Box::new(InMemorySessionStore::new()),
        Box::new(PngQrRenderer::new()),
        Box::new(Silent),
        Box::new(log),
    );

    machine.handle(user, Event::StartPayment).await.unwrap();
    machine
        .handle(user, Event::Text(amount.to_string()))
        .await
        .unwrap();
    machine
        .handle(user, Event::SelectService("none".into()))
        .await
        .unwrap();
    let outcome = machine.handle(user, Event::Confirm).await.unwrap();
    assert!(matches!(outcome, Outcome::Emitted(_)));
}

#[tokio::test]
async fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: issue one payment
    issue(RocksDbPaymentLog::open(&db_path).unwrap(), UserId(1), "1500").await;

    // 2. Second run: reopen the same path and issue another
    issue(RocksDbPaymentLog::open(&db_path).unwrap(), UserId(2), "250,50").await;

    // Both payments survive, in issue order
    let payments = RocksDbPaymentLog::open(&db_path).unwrap().all().await.unwrap();
    assert_eq!(payments.len(), 2);
    assert_eq!(payments[0].user_id, UserId(1));
    assert!(payments[0].payload.contains("*AM:1500*"));
    assert_eq!(payments[1].user_id, UserId(2));
    assert!(payments[1].payload.contains("*AM:250,50*"));
}
