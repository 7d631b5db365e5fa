//! Tracking numbers and offer tokens.
//!
//! A tracking number is `CARRIER` + base-36 creation millis + a two-digit base-36
//! sequence + the country suffix, e.g. `DHLMGX3K2Q80AMX`. The sequence is process-wide,
//! so numbers created for the same carrier in the same millisecond still differ.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SEQUENCE_WIDTH: usize = 2;
const SEQUENCE_SPACE: u64 = 36 * 36;
const TOKEN_SEQUENCE_SPACE: u64 = 36 * 36 * 36 * 36;

static TRACKING_SEQUENCE: AtomicU64 = AtomicU64::new(0);
static TOKEN_SEQUENCE: AtomicU64 = AtomicU64::new(0);

pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

pub fn from_base36(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }
    text.chars().try_fold(0u64, |acc, c| {
        let digit = c.to_digit(36)?;
        acc.checked_mul(36)?.checked_add(u64::from(digit))
    })
}

fn padded_base36(value: u64, width: usize) -> String {
    format!("{:0>width$}", to_base36(value), width = width)
}

fn millis(now: DateTime<Utc>) -> u64 {
    u64::try_from(now.timestamp_millis()).unwrap_or(0)
}

/// Uniqueness token appended to offer ids so repeated quotes never collide.
pub fn unique_token(now: DateTime<Utc>) -> String {
    let seq = TOKEN_SEQUENCE.fetch_add(1, Ordering::Relaxed) % TOKEN_SEQUENCE_SPACE;
    format!("{}{}", to_base36(millis(now)), padded_base36(seq, 4))
}

#[derive(Debug, Clone)]
pub struct TrackingNumberGenerator {
    suffix: String,
}

impl TrackingNumberGenerator {
    pub fn new(country_suffix: impl Into<String>) -> Self {
        Self {
            suffix: country_suffix.into(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn generate(&self, carrier_id: &str, now: DateTime<Utc>) -> String {
        let seq = TRACKING_SEQUENCE.fetch_add(1, Ordering::Relaxed) % SEQUENCE_SPACE;
        format!(
            "{}{}{}{}",
            carrier_id.to_uppercase(),
            to_base36(millis(now)),
            padded_base36(seq, SEQUENCE_WIDTH),
            self.suffix
        )
    }

    /// Recovers the creation instant of a number this generator produced for `carrier_id`.
    /// Returns `None` for anything else.
    pub fn decode_created_at(
        &self,
        tracking_number: &str,
        carrier_id: &str,
    ) -> Option<DateTime<Utc>> {
        let upper = tracking_number.trim().to_uppercase();
        let body = upper
            .strip_prefix(&carrier_id.to_uppercase())?
            .strip_suffix(self.suffix.as_str())?;

        if body.len() <= SEQUENCE_WIDTH || !body.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }

        let time_part = &body[..body.len() - SEQUENCE_WIDTH];
        let millis = i64::try_from(from_base36(time_part)?).ok()?;
        DateTime::from_timestamp_millis(millis)
    }
}
