//! Transactability checks for Values.

use chrono::{DateTime, Utc};

use super::types::Value;

/// Returns true if `now` falls inside the Value's redemption window.
///
/// An absent bound is open: no `start_date` means "always started", no
/// `end_date` means "never expires".
#[must_use]
pub fn date_window_contains(value: &Value, now: DateTime<Utc>) -> bool {
    let started = value.start_date.is_none_or(|start| start <= now);
    let not_ended = value.end_date.is_none_or(|end| end >= now);
    started && not_ended
}

/// Returns true if the Value can participate in a transaction at all:
/// active, not frozen, not canceled, and inside its date window.
#[must_use]
pub fn is_transactable(value: &Value, now: DateTime<Utc>) -> bool {
    value.active && !value.frozen && !value.canceled && date_window_contains(value, now)
}

/// Returns true if the Value can be drawn down right now.
///
/// On top of [`is_transactable`], a Value with zero uses remaining cannot
/// redeem (while `uses_remaining == None` means unlimited uses).
#[must_use]
pub fn is_redeemable(value: &Value, now: DateTime<Utc>) -> bool {
    is_transactable(value, now) && value.uses_remaining != Some(0)
}
