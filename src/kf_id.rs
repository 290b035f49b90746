//! Kids First identifiers and row timestamps.
//!
//! A kf_id is a two letter entity prefix, an underscore, and eight characters
//! of Crockford base32, e.g. `PT_3K7QZ1AB`.

use chrono::{SubsecRound, Utc};
use rand::Rng;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Crockford base32: no I, L, O or U.
const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const BODY_LEN: usize = 8;

pub const STUDY_PREFIX: &str = "SD";
pub const PARTICIPANT_PREFIX: &str = "PT";
pub const ALIAS_GROUP_PREFIX: &str = "AG";
pub const GENOMIC_FILE_PREFIX: &str = "GF";

/// Generates a fresh kf_id with the given entity prefix.
pub fn generate(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let body: String = (0..BODY_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}_{}", prefix, body)
}

/// Current time truncated to microseconds.
///
/// Cursors render microsecond timestamps, so stored `created_at` values must
/// not carry finer precision or a row could never be paged past exactly.
pub fn now() -> DateTimeWithTimeZone {
    Utc::now().trunc_subsecs(6).fixed_offset()
}
