//! Application layer containing the payment conversation orchestration.
//!
//! `PaymentSessionMachine` is the single entry point for user events. It applies the
//! domain transition function, stores the resulting session and talks to the user
//! through the `Messenger` port.

pub mod machine;
pub mod messages;
