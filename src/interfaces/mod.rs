//! Edges of the application: file formats and the messaging transport.

pub mod csv;
pub mod telegram;
