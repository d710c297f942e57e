//! Minute-of-day values.
//!
//! The device stores `START`/`END` as minutes since midnight while the form
//! shows them as zero-padded `HH:MM`.

/// Minutes in a day; valid minute values are `0..MINUTES_PER_DAY`.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Formats minutes since midnight as zero-padded `HH:MM`.
///
/// Values outside a single day are reported as `None`.
///
/// # Examples
///
/// ```
/// use busnotify_config::protocol::format_time;
///
/// assert_eq!(format_time(360).as_deref(), Some("06:00"));
/// assert_eq!(format_time(1440), None);
/// ```
#[must_use]
pub fn format_time(minutes: u16) -> Option<String> {
    if minutes >= MINUTES_PER_DAY {
        return None;
    }
    Some(format!("{:02}:{:02}", minutes / 60, minutes % 60))
}

/// Parses `HH:MM` into minutes since midnight.
///
/// Hours may be written without padding (`6:00`); minutes must have two
/// digits. Surrounding whitespace is ignored.
///
/// # Examples
///
/// ```
/// use busnotify_config::protocol::parse_time;
///
/// assert_eq!(parse_time("06:00"), Some(360));
/// assert_eq!(parse_time("24:00"), None);
/// ```
#[must_use]
pub fn parse_time(text: &str) -> Option<u16> {
    let (hours, minutes) = text.trim().split_once(':')?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return None;
    }
    if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: u16 = hours.parse().ok()?;
    let minutes: u16 = minutes.parse().ok()?;
    if hours >= 24 || minutes >= 60 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Parses a device minute count (`"360"`) into a validated minute value.
#[must_use]
pub fn parse_minutes(text: &str) -> Option<u16> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<u16>()
        .ok()
        .filter(|minutes| *minutes < MINUTES_PER_DAY)
}
