//! Opaque pagination bookmarks.
//!
//! A marker is the ordering-key value of a boundary row plus the direction
//! to resume in. On the wire it is a base64url token so it can travel in a
//! query parameter; clients must treat it as an uninterpreted string.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid pagination cursor")]
pub struct InvalidCursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Resume with rows strictly after the key (forward browsing).
    After,
    /// Resume with rows strictly before the key (backward browsing).
    Before,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub direction: Direction,
    pub key: i64,
}

impl Marker {
    pub fn after(key: i64) -> Self {
        Self {
            direction: Direction::After,
            key,
        }
    }

    pub fn before(key: i64) -> Self {
        Self {
            direction: Direction::Before,
            key,
        }
    }

    /// SQL comparison operator selecting rows past this marker.
    pub fn comparison(&self) -> &'static str {
        match self.direction {
            Direction::After => ">",
            Direction::Before => "<",
        }
    }

    /// Sort order for the window fetch. Backward windows are fetched in
    /// descending order and reversed during page assembly.
    pub fn sort_order(&self) -> &'static str {
        match self.direction {
            Direction::After => "ASC",
            Direction::Before => "DESC",
        }
    }
}

/// Serialize a marker to its opaque token form.
pub fn encode(marker: &Marker) -> String {
    let tag = match marker.direction {
        Direction::After => "after",
        Direction::Before => "before",
    };
    URL_SAFE_NO_PAD.encode(format!("{}:{}", tag, marker.key))
}

/// Parse a token back into a marker.
///
/// Fails with `InvalidCursor` on anything this codec did not produce:
/// bad base64, non-UTF-8 payload, missing or unknown direction tag, or a
/// key that is not an integer. Never panics on foreign input.
pub fn decode(token: &str) -> Result<Marker, InvalidCursor> {
    let bytes = URL_SAFE_NO_PAD.decode(token).map_err(|_| InvalidCursor)?;
    let payload = String::from_utf8(bytes).map_err(|_| InvalidCursor)?;

    let (tag, key) = payload.split_once(':').ok_or(InvalidCursor)?;
    let key: i64 = key.parse().map_err(|_| InvalidCursor)?;

    match tag {
        "after" => Ok(Marker::after(key)),
        "before" => Ok(Marker::before(key)),
        _ => Err(InvalidCursor),
    }
}

/// Decode an optional query-parameter token.
pub fn decode_param(token: Option<&str>) -> Result<Option<Marker>, InvalidCursor> {
    token.map(decode).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_both_directions() {
        for marker in [Marker::after(1), Marker::after(i64::MAX), Marker::before(42)] {
            assert_eq!(decode(&encode(&marker)), Ok(marker));
        }
    }

    #[test]
    fn tokens_are_url_safe() {
        let token = encode(&Marker::after(1234567890));
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn rejects_bad_base64() {
        assert_eq!(decode("not%valid!"), Err(InvalidCursor));
    }

    #[test]
    fn rejects_foreign_payloads() {
        // Well-formed base64 of structurally wrong payloads
        for payload in ["garbage", "after", "after:", "after:abc", "sideways:3", ":9"] {
            let token = URL_SAFE_NO_PAD.encode(payload);
            assert_eq!(decode(&token), Err(InvalidCursor), "payload {payload:?}");
        }
    }

    #[test]
    fn rejects_non_utf8_payload() {
        let token = URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0x00]);
        assert_eq!(decode(&token), Err(InvalidCursor));
    }

    #[test]
    fn extra_separator_lands_in_key_and_fails() {
        let token = URL_SAFE_NO_PAD.encode("after:1:2");
        assert_eq!(decode(&token), Err(InvalidCursor));
    }

    #[test]
    fn decode_param_passes_absent_through() {
        assert_eq!(decode_param(None), Ok(None));
        let token = encode(&Marker::after(7));
        assert_eq!(decode_param(Some(&token)), Ok(Some(Marker::after(7))));
    }
}
