//! Firmware variant selection at connection time.
//!
//! With a fixed variant the reader is a thin wrapper around
//! [`BatchApplier`]. When detecting, it starts on the key table both
//! flavours share, so common keys reach the sink as they arrive, and switches
//! to the full table on the first key that tells the flavours apart: a
//! service key (even with an empty value) or a sentinel.

use super::applier::{BatchApplier, FieldSink, LineOutcome};
use super::variant::ProtocolVariant;

/// How the reader picks its key table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VariantSelection {
    /// Use this variant from the first line.
    Fixed(ProtocolVariant),
    /// Detect the variant from the keys the device reports.
    #[default]
    Detect,
}

/// Applies preference lines, selecting the firmware variant on the fly.
#[derive(Debug)]
pub struct PreferenceReader {
    applier: BatchApplier,
    variant: Option<ProtocolVariant>,
}

impl PreferenceReader {
    /// Creates a reader.
    #[must_use]
    pub fn new(selection: VariantSelection) -> Self {
        match selection {
            VariantSelection::Fixed(variant) => Self {
                applier: BatchApplier::new(variant.key_table()),
                variant: Some(variant),
            },
            VariantSelection::Detect => Self {
                applier: BatchApplier::new(ProtocolVariant::shared_key_table()),
                variant: None,
            },
        }
    }

    /// The variant in use, once known.
    #[must_use]
    pub const fn variant(&self) -> Option<ProtocolVariant> {
        self.variant
    }

    /// The underlying applier.
    #[must_use]
    pub const fn applier(&self) -> &BatchApplier {
        &self.applier
    }

    /// Applies one complete line.
    pub fn apply_line(&mut self, line: &str, sink: &mut dyn FieldSink) -> LineOutcome {
        if self.variant.is_none()
            && let Some(variant) = detect(line)
        {
            tracing::info!(%variant, "protocol variant selected");
            self.applier.switch_table(variant.key_table());
            self.variant = Some(variant);
        }
        self.applier.apply_line(line, sink)
    }

    /// Drops any partially received batch.
    ///
    /// A variant that has already been selected stays selected.
    pub fn reset(&mut self) {
        self.applier.reset();
    }
}

/// Variant revealed by the key of `line`; the value may be empty.
fn detect(line: &str) -> Option<ProtocolVariant> {
    let (key, _) = line.trim().split_once('=')?;
    let key = key.trim();
    ProtocolVariant::from_service_key(key).or_else(|| ProtocolVariant::from_sentinel(key))
}
