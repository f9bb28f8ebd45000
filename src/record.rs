//! Record addressing helpers: record keys, record URIs and stored timestamps.

use time::{OffsetDateTime, UtcOffset};

/// Collection every status record lives in.
pub const STATUS_COLLECTION: &str = "xyz.statusphere.status";

const TID_ALPHABET: &[u8; 32] = b"234567abcdefghijklmnopqrstuvwxyz";
const TID_LEN: usize = 13;

/// Builds the URI of a status record owned by `author`.
pub fn status_uri(author: &str, record_key: &str) -> String {
    format!("at://{author}/{STATUS_COLLECTION}/{record_key}")
}

/// Mints a timestamp identifier (TID) for `now`.
///
/// A TID packs the microseconds since the Unix epoch (53 bits) above a 10 bit
/// clock identifier and renders it as 13 characters of sortable base32, so
/// keys minted later compare greater.
pub fn new_tid(now: OffsetDateTime) -> String {
    let clock_id = rand::random::<u16>() & 0x3ff;
    encode_tid(now, clock_id)
}

fn encode_tid(now: OffsetDateTime, clock_id: u16) -> String {
    let micros = (now.unix_timestamp_nanos() / 1_000).max(0) as u64 & ((1 << 53) - 1);
    let mut value = (micros << 10) | u64::from(clock_id & 0x3ff);
    let mut out = [0u8; TID_LEN];
    for slot in out.iter_mut().rev() {
        *slot = TID_ALPHABET[(value & 0x1f) as usize];
        value >>= 5;
    }
    out.iter().map(|&b| char::from(b)).collect()
}

/// Formats `ts` as fixed-width UTC ISO-8601 with millisecond precision,
/// e.g. `2024-05-01T09:30:00.250Z`.
///
/// The fixed width keeps string order identical to chronological order, which
/// the store relies on when sorting by `indexedAt`.
pub fn iso8601(ts: OffsetDateTime) -> String {
    let ts = ts.to_offset(UtcOffset::UTC);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        ts.year(),
        u8::from(ts.month()),
        ts.day(),
        ts.hour(),
        ts.minute(),
        ts.second(),
        ts.millisecond()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn uri_is_scoped_to_author_and_collection() {
        assert_eq!(
            status_uri("did:plc:abc", "3jzfcijpj2z2a"),
            "at://did:plc:abc/xyz.statusphere.status/3jzfcijpj2z2a"
        );
    }

    #[test]
    fn tid_is_thirteen_sortable_chars() {
        let earlier = encode_tid(datetime!(2024-01-01 00:00:00 UTC), 7);
        let later = encode_tid(datetime!(2024-01-01 00:00:00.000001 UTC), 0);
        assert_eq!(earlier.len(), TID_LEN);
        assert!(earlier.bytes().all(|b| TID_ALPHABET.contains(&b)));
        assert!(later > earlier);
    }

    #[test]
    fn iso8601_is_fixed_width_utc() {
        let ts = datetime!(2024-05-01 11:30:00.25 +02:00);
        assert_eq!(iso8601(ts), "2024-05-01T09:30:00.250Z");
        assert_eq!(iso8601(datetime!(2024-05-01 09:30:00 UTC)), "2024-05-01T09:30:00.000Z");
    }
}
