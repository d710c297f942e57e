//! # busnotify-config
//!
//! Serial configurator for the bus-arrival notifier.
//!
//! The notifier reports its preferences as `KEY=VALUE` lines and accepts
//! `SET_KEY=VALUE` commands over a serial link. This crate reassembles the
//! chunked serial stream into lines, applies preference lines to a form,
//! detects when a full batch has arrived, and pushes edited forms back.
//!
//! ## Layout
//!
//! - [`protocol`]: line reassembly, preference parsing, firmware key tables
//! - [`core`]: the preference form and its validation
//! - [`transport`]: serial and scripted byte streams
//! - [`session`]: connection lifecycle and request handling
//! - [`cli`]: the `busnotify` command-line front end

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]

pub mod cli;
pub mod core;
pub mod error;
pub mod io;
pub mod protocol;
pub mod session;
pub mod transport;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

pub use core::PreferenceForm;

pub use protocol::{
    BatchApplier, FieldSink, HostCommand, KeyTable, LineOutcome, PreferenceReader,
    PreferenceSnapshot, ProtocolVariant, StreamReassembler, VariantSelection, format_time,
    parse_time,
};

pub use session::{BatchStatus, Controller, Request, Session, SessionEvent, SessionState};

pub use transport::{ReadOutcome, ScriptedTransport, SerialTransport, Transport};

pub use cli::{Cli, Commands, OutputFormat};
