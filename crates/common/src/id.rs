//! ID generation utilities.

use std::sync::atomic::{AtomicI64, Ordering};

use rand::Rng;
use ulid::Ulid;
use uuid::Uuid;

const USER_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const BASE36_DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Last timestamp handed out for a report ID, shared by every generator in the process.
static LAST_REPORT_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Prefix of a citizen or official account ID.
pub const USER_ID_PREFIX: &str = "CG";
/// Prefix of a complaint ID.
pub const COMPLAINT_ID_PREFIX: &str = "CR";
/// Prefix of a suspicious entity report ID.
pub const SUSPICIOUS_REPORT_ID_PREFIX: &str = "SR";
/// Random characters after the timestamp of a report ID.
const REPORT_ID_SUFFIX_LEN: usize = 4;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID for internal rows.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a user-facing account ID: `CG` followed by 6 uppercase alphanumerics.
    #[must_use]
    pub fn generate_user_id(&self) -> String {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..6)
            .map(|_| {
                let idx = rng.gen_range(0..USER_ID_ALPHABET.len());
                char::from(USER_ID_ALPHABET[idx])
            })
            .collect();
        format!("{USER_ID_PREFIX}{suffix}")
    }

    /// Generate a complaint ID (`CR` + base36 timestamp + random suffix).
    #[must_use]
    pub fn generate_complaint_id(&self) -> String {
        format!(
            "{COMPLAINT_ID_PREFIX}{}{}",
            next_report_stamp(),
            random_suffix(REPORT_ID_SUFFIX_LEN)
        )
    }

    /// Generate a suspicious entity report ID (`SR` + base36 timestamp + random suffix).
    #[must_use]
    pub fn generate_suspicious_report_id(&self) -> String {
        format!(
            "{SUSPICIOUS_REPORT_ID_PREFIX}{}{}",
            next_report_stamp(),
            random_suffix(REPORT_ID_SUFFIX_LEN)
        )
    }

    /// Generate a cryptographically secure random session token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // Use UUID v4 for tokens (no time component for security)
        Uuid::new_v4().simple().to_string()
    }
}

/// Millisecond timestamp, bumped past the last one issued so that two reports
/// filed in the same millisecond still get distinct IDs.
fn next_report_stamp() -> String {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_REPORT_MILLIS.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_REPORT_MILLIS.compare_exchange_weak(
            last,
            next,
            Ordering::SeqCst,
            Ordering::Relaxed,
        ) {
            Ok(_) => return to_base36(next),
            Err(actual) => last = actual,
        }
    }
}

/// Uppercase alphanumerics. Keeps IDs from separate server processes apart.
fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(BASE36_DIGITS[rng.gen_range(0..BASE36_DIGITS.len())]))
        .collect()
}

fn to_base36(mut value: i64) -> String {
    if value <= 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}
