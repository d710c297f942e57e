//! Core domain models.
//!
//! Pure data with no I/O: the preference form the protocol fills in and the
//! commands are built from.

pub mod form;

pub use form::PreferenceForm;
