//! Domain layer: amounts, the service catalog, the SPD payload format and the
//! pure payment-session state machine. Nothing here performs I/O.

pub mod amount;
pub mod event;
pub mod payload;
pub mod ports;
pub mod service;
pub mod session;
