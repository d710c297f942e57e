//! Device line protocol.
//!
//! The device and host exchange newline-terminated ASCII lines. Incoming
//! chunks go through a [`StreamReassembler`], completed lines through a
//! [`PreferenceReader`] (or a bare [`BatchApplier`] when the firmware variant
//! is known), which writes form fields and reports completed batches. These
//! are plain state machines with no I/O.

pub mod applier;
pub mod command;
pub mod negotiate;
pub mod reassembler;
pub mod time;
pub mod variant;

pub use applier::{BatchApplier, FieldSink, LineOutcome, PreferenceSnapshot, split_assignment};
pub use command::{GET_PREFS, HostCommand};
pub use negotiate::{PreferenceReader, VariantSelection};
pub use reassembler::StreamReassembler;
pub use time::{MINUTES_PER_DAY, format_time, parse_minutes, parse_time};
pub use variant::{KeyBinding, KeyTable, ProtocolVariant, ValueTransform, fields};
