//! Device sessions.
//!
//! A [`Session`] is one open connection with its own parse state; the
//! [`Controller`] turns user requests into session operations.

pub mod connection;
pub mod controller;

pub use connection::{BatchStatus, EchoSink, Session, SessionEvent, SessionState};
pub use controller::{Controller, Request};
