//! PIN record lifecycle.
//!
//! The record moves between three states:
//!
//! * absent - no row yet; the first use writes the default PIN,
//! * active - `is_locked == false`, counting failed attempts,
//! * locked - `is_locked == true` with `lock_until` set; verification is refused
//!   until `lock_until` has passed, after which the record is active again with
//!   zero attempts.
//!
//! Transitions are pure functions over [`PinRecord`] so they can be tested without a
//! database; the async wrappers load the record, apply a transition and save it back.

use crate::{
    config::SecuritySettings,
    entities::{PinSetting, pin_setting},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{Set, prelude::*, sea_query::OnConflict};
use std::collections::HashSet;
use tracing::{info, instrument, warn};

/// The persisted PIN record.
pub type PinRecord = pin_setting::Model;

/// PINs the app has shipped as defaults.
const DEFAULT_PINS: [&str; 3] = ["4321", "0000", "1234"];

/// PINs people pick too often to be worth guessing last.
const COMMON_PINS: [&str; 12] = [
    "0000", "1111", "2222", "3333", "4444", "5555", "6666", "7777", "8888", "9999", "1234", "4321",
];

const ASCENDING: &str = "0123456789";
const DESCENDING: &str = "9876543210";

/// Informational strength rating; never blocks a PIN change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinStrength {
    /// Repeated digits, a run, a step pattern or a common choice
    Weak,
    /// Not weak, but with a repeated digit
    Medium,
    /// Four distinct digits with no pattern
    Strong,
}

/// Result of one verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinVerification {
    /// Candidate matched; attempts were reset.
    Success,
    /// Candidate did not match.
    Rejected {
        /// Attempts left before the record locks (0 once it has locked)
        remaining_attempts: u32,
        /// Set when this failure locked the record
        locked_until: Option<DateTime<Utc>>,
    },
    /// The record is locked; nothing was changed.
    AccountLocked {
        /// Whole minutes until the lock expires, rounded up
        minutes_remaining: i64,
    },
}

/// Whether `pin` is exactly four ASCII digits.
#[must_use]
pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == 4 && pin.bytes().all(|b| b.is_ascii_digit())
}

/// Whether `pin` is one of the factory defaults.
#[must_use]
pub fn is_default_pin(pin: &str) -> bool {
    DEFAULT_PINS.contains(&pin)
}

/// Replaces every character of `pin` with a bullet.
#[must_use]
pub fn mask_pin(pin: &str) -> String {
    "•".repeat(pin.chars().count())
}

/// Rates a four-digit PIN.
#[must_use]
pub fn assess_pin_strength(pin: &str) -> PinStrength {
    let bytes = pin.as_bytes();
    let all_same = !bytes.is_empty() && bytes.iter().all(|b| *b == bytes[0]);
    if all_same {
        return PinStrength::Weak;
    }

    let is_run = ASCENDING.contains(pin) || DESCENDING.contains(pin);
    let is_step = matches!(pin, "1357" | "2468" | "3579");
    if is_run || is_step || COMMON_PINS.contains(&pin) {
        return PinStrength::Weak;
    }

    let distinct: HashSet<u8> = bytes.iter().copied().collect();
    if distinct.len() == 4 {
        PinStrength::Strong
    } else {
        PinStrength::Medium
    }
}

/// A fresh, unlocked record for `pin`.
#[must_use]
pub fn new_record(pin: &str, now: DateTime<Utc>) -> PinRecord {
    PinRecord {
        id: pin_setting::SINGLETON_ID,
        pin: pin.to_string(),
        is_enabled: true,
        created_at: now,
        last_modified: now,
        failed_attempts: 0,
        last_attempt: None,
        is_locked: false,
        lock_until: None,
    }
}

/// Minutes until `lock_until`, rounded up; `None` if the lock has already expired.
#[must_use]
pub fn lock_minutes_remaining(record: &PinRecord, now: DateTime<Utc>) -> Option<i64> {
    if !record.is_locked {
        return None;
    }
    let until = record.lock_until?;
    if now >= until {
        return None;
    }
    let millis = (until - now).num_milliseconds();
    Some((millis + 59_999) / 60_000)
}

/// Returns a locked record whose lock has expired to the active state.
///
/// Returns `true` if the record changed.
pub fn clear_expired_lock(record: &mut PinRecord, now: DateTime<Utc>) -> bool {
    if record.is_locked && lock_minutes_remaining(record, now).is_none() {
        record.failed_attempts = 0;
        record.is_locked = false;
        record.lock_until = None;
        return true;
    }
    false
}

/// Applies one verification attempt to `record`.
///
/// A record locked until after `now` is left untouched and reported as
/// [`PinVerification::AccountLocked`]. Otherwise an expired lock is cleared first,
/// then the candidate is compared.
pub fn verify(
    record: &mut PinRecord,
    candidate: &str,
    now: DateTime<Utc>,
    settings: &SecuritySettings,
) -> PinVerification {
    if let Some(minutes_remaining) = lock_minutes_remaining(record, now) {
        return PinVerification::AccountLocked { minutes_remaining };
    }
    clear_expired_lock(record, now);

    record.last_attempt = Some(now);

    if candidate == record.pin {
        record.failed_attempts = 0;
        record.is_locked = false;
        record.lock_until = None;
        return PinVerification::Success;
    }

    record.failed_attempts = record.failed_attempts.saturating_add(1);
    record.last_modified = now;

    let attempts = u32::try_from(record.failed_attempts).unwrap_or(u32::MAX);
    if attempts >= settings.max_attempts {
        let until = now + Duration::minutes(i64::from(settings.lockout_minutes));
        record.is_locked = true;
        record.lock_until = Some(until);
        return PinVerification::Rejected {
            remaining_attempts: 0,
            locked_until: Some(until),
        };
    }

    PinVerification::Rejected {
        remaining_attempts: settings.max_attempts - attempts,
        locked_until: None,
    }
}

/// Loads the PIN record, if one was ever written.
pub async fn get_pin_record(db: &DatabaseConnection) -> Result<Option<PinRecord>> {
    PinSetting::find_by_id(pin_setting::SINGLETON_ID)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Replaces the PIN record. The id is forced to the singleton key.
pub async fn save_pin_record(db: &DatabaseConnection, record: &PinRecord) -> Result<()> {
    let active = pin_setting::ActiveModel {
        id: Set(pin_setting::SINGLETON_ID),
        pin: Set(record.pin.clone()),
        is_enabled: Set(record.is_enabled),
        created_at: Set(record.created_at),
        last_modified: Set(record.last_modified),
        failed_attempts: Set(record.failed_attempts),
        last_attempt: Set(record.last_attempt),
        is_locked: Set(record.is_locked),
        lock_until: Set(record.lock_until),
    };

    PinSetting::insert(active)
        .on_conflict(
            OnConflict::column(pin_setting::Column::Id)
                .update_columns([
                    pin_setting::Column::Pin,
                    pin_setting::Column::IsEnabled,
                    pin_setting::Column::CreatedAt,
                    pin_setting::Column::LastModified,
                    pin_setting::Column::FailedAttempts,
                    pin_setting::Column::LastAttempt,
                    pin_setting::Column::IsLocked,
                    pin_setting::Column::LockUntil,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;
    Ok(())
}

/// Returns the PIN record, writing one with the configured default PIN if absent.
#[instrument(skip(db, settings))]
pub async fn ensure_pin_record(
    db: &DatabaseConnection,
    settings: &SecuritySettings,
    now: DateTime<Utc>,
) -> Result<PinRecord> {
    if let Some(record) = get_pin_record(db).await? {
        return Ok(record);
    }
    let record = new_record(&settings.default_pin, now);
    save_pin_record(db, &record).await?;
    info!("Initialized PIN record with default PIN");
    Ok(record)
}

/// Verifies `candidate` against the stored PIN and persists the resulting state.
#[instrument(skip(db, settings, candidate))]
pub async fn verify_pin(
    db: &DatabaseConnection,
    settings: &SecuritySettings,
    candidate: &str,
    now: DateTime<Utc>,
) -> Result<PinVerification> {
    let mut record = ensure_pin_record(db, settings, now).await?;
    let outcome = verify(&mut record, candidate, now, settings);

    match outcome {
        PinVerification::AccountLocked { minutes_remaining } => {
            warn!(minutes_remaining, "Verification refused while locked");
        }
        PinVerification::Rejected {
            remaining_attempts,
            locked_until,
        } => {
            save_pin_record(db, &record).await?;
            if locked_until.is_some() {
                warn!(attempts = record.failed_attempts, "PIN locked after failed attempts");
            } else {
                info!(remaining_attempts, "Incorrect PIN");
            }
        }
        PinVerification::Success => {
            save_pin_record(db, &record).await?;
            info!("PIN verified");
        }
    }
    Ok(outcome)
}

/// Replaces the PIN, resetting attempts and clearing any lock.
///
/// # Errors
/// Returns [`Error::Validation`] if `new_pin` is not four digits or equals the current
/// PIN.
#[instrument(skip(db, settings, new_pin))]
pub async fn change_pin(
    db: &DatabaseConnection,
    settings: &SecuritySettings,
    new_pin: &str,
    now: DateTime<Utc>,
) -> Result<PinRecord> {
    if !is_valid_pin(new_pin) {
        return Err(Error::validation("PIN must be exactly 4 digits"));
    }

    let existing = get_pin_record(db).await?;
    let current = existing
        .as_ref()
        .map_or(settings.default_pin.as_str(), |r| r.pin.as_str());
    if new_pin == current {
        return Err(Error::validation("new PIN must differ from the current PIN"));
    }

    let mut record = new_record(new_pin, now);
    if let Some(existing) = existing {
        record.created_at = existing.created_at;
    }
    save_pin_record(db, &record).await?;

    if assess_pin_strength(new_pin) == PinStrength::Weak {
        warn!("PIN changed to a weak PIN");
    } else {
        info!("PIN changed");
    }
    Ok(record)
}

/// Checks whether the record is currently locked.
///
/// Returns the minutes remaining while locked. An expired lock is cleared and saved.
pub async fn lock_status(db: &DatabaseConnection, now: DateTime<Utc>) -> Result<Option<i64>> {
    let Some(mut record) = get_pin_record(db).await? else {
        return Ok(None);
    };
    if let Some(minutes) = lock_minutes_remaining(&record, now) {
        return Ok(Some(minutes));
    }
    if clear_expired_lock(&mut record, now) {
        save_pin_record(db, &record).await?;
        info!("Expired PIN lock cleared");
    }
    Ok(None)
}
