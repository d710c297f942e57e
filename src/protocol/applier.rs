//! Preference line interpretation.
//!
//! Completed lines are parsed as `KEY=VALUE`, recognised keys are forwarded
//! to a [`FieldSink`] one at a time, and the sentinel key closes the batch.
//! Anything that does not parse is dropped: the serial link carries boot
//! logs and debug prints alongside preference lines.

use super::variant::KeyTable;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Receiver of field updates.
pub trait FieldSink {
    /// Sets a named form field.
    fn set_field(&mut self, field: &str, value: String);
}

impl FieldSink for HashMap<String, String> {
    fn set_field(&mut self, field: &str, value: String) {
        self.insert(field.to_string(), value);
    }
}

impl FieldSink for BTreeMap<String, String> {
    fn set_field(&mut self, field: &str, value: String) {
        self.insert(field.to_string(), value);
    }
}

/// Raw device values received during one batch, keyed by device key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreferenceSnapshot {
    values: BTreeMap<String, String>,
}

impl PreferenceSnapshot {
    /// Raw value reported for a device key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Number of distinct keys received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing was received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(key, raw value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn record(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// What applying a single line did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Blank, malformed, unknown or unconvertible line.
    Ignored,
    /// A field was updated.
    Applied {
        /// Form field that changed.
        field: String,
        /// Value written to the field.
        value: String,
    },
    /// The sentinel field was updated and the batch is complete.
    BatchComplete {
        /// Form field that changed.
        field: String,
        /// Value written to the field.
        value: String,
        /// Everything received in the batch.
        snapshot: PreferenceSnapshot,
    },
}

impl LineOutcome {
    /// Returns `true` for [`LineOutcome::BatchComplete`].
    #[must_use]
    pub const fn is_batch_complete(&self) -> bool {
        matches!(self, Self::BatchComplete { .. })
    }
}

/// Splits a line into a trimmed `(key, value)` pair on the first `=`.
///
/// Returns `None` for lines without `=` or with an empty key or value.
///
/// # Examples
///
/// ```
/// use busnotify_config::protocol::split_assignment;
///
/// assert_eq!(split_assignment(" START = 360 "), Some(("START", "360")));
/// assert_eq!(split_assignment("K=a=b"), Some(("K", "a=b")));
/// assert_eq!(split_assignment("novalue="), None);
/// ```
#[must_use]
pub fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.trim().split_once('=')?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Applies preference lines to a sink according to a [`KeyTable`].
#[derive(Debug, Clone)]
pub struct BatchApplier {
    table: KeyTable,
    snapshot: PreferenceSnapshot,
    batches: usize,
}

impl BatchApplier {
    /// Creates an applier for the given key table.
    #[must_use]
    pub fn new(table: KeyTable) -> Self {
        Self {
            table,
            snapshot: PreferenceSnapshot::default(),
            batches: 0,
        }
    }

    /// The key table in use.
    #[must_use]
    pub const fn table(&self) -> &KeyTable {
        &self.table
    }

    /// Number of batches completed so far.
    #[must_use]
    pub const fn batches_completed(&self) -> usize {
        self.batches
    }

    /// Values received so far in the current, incomplete batch.
    #[must_use]
    pub const fn in_progress(&self) -> &PreferenceSnapshot {
        &self.snapshot
    }

    /// Applies one complete line.
    pub fn apply_line(&mut self, line: &str, sink: &mut dyn FieldSink) -> LineOutcome {
        let Some((key, value)) = split_assignment(line) else {
            if !line.trim().is_empty() {
                tracing::debug!(line = line.trim(), "discarding non-assignment line");
            }
            return LineOutcome::Ignored;
        };

        let Some(binding) = self.table.binding(key) else {
            tracing::debug!(key, "ignoring unrecognised key");
            return LineOutcome::Ignored;
        };

        let Some(converted) = binding.transform.to_form(value) else {
            tracing::debug!(key, value, "discarding unconvertible value");
            return LineOutcome::Ignored;
        };

        let field = binding.field.clone();
        sink.set_field(&field, converted.clone());
        self.snapshot.record(key, value);

        if self.table.sentinel() == Some(key) {
            self.batches += 1;
            let snapshot = std::mem::take(&mut self.snapshot);
            tracing::debug!(keys = snapshot.len(), "preference batch complete");
            return LineOutcome::BatchComplete {
                field,
                value: converted,
                snapshot,
            };
        }

        LineOutcome::Applied {
            field,
            value: converted,
        }
    }

    /// Swaps in another key table, keeping the batch received so far.
    pub fn switch_table(&mut self, table: KeyTable) {
        self.table = table;
    }

    /// Drops any partially received batch.
    pub fn reset(&mut self) {
        self.snapshot = PreferenceSnapshot::default();
    }
}
