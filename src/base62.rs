//! Base-62 codec for compact textual ids.
//!
//! Alphabet is `[0-9A-Za-z]` with digits first, most significant symbol
//! first; zero encodes to `"0"`.

use crate::error::Base62Error;

const RADIX: i64 = 62;
const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

fn symbol_value(byte: u8) -> Option<i64> {
    match byte {
        b'0'..=b'9' => Some(i64::from(byte - b'0')),
        b'A'..=b'Z' => Some(i64::from(byte - b'A') + 10),
        b'a'..=b'z' => Some(i64::from(byte - b'a') + 36),
        _ => None,
    }
}

/// Encode a non-negative id.
pub fn encode(id: i64) -> Result<String, Base62Error> {
    if id < 0 {
        return Err(Base62Error::Negative(id));
    }
    if id == 0 {
        return Ok(char::from(ALPHABET[0]).to_string());
    }
    let mut digits = Vec::with_capacity(11);
    let mut rest = id;
    while rest > 0 {
        digits.push(ALPHABET[(rest % RADIX) as usize]);
        rest /= RADIX;
    }
    digits.reverse();
    Ok(digits.into_iter().map(char::from).collect())
}

/// Decode a base-62 code back to its id. Rejects empty input, symbols
/// outside the alphabet, and codes exceeding `i64::MAX`.
pub fn decode(code: &str) -> Result<i64, Base62Error> {
    if code.is_empty() {
        return Err(Base62Error::Empty);
    }
    let mut id: i64 = 0;
    for ch in code.chars() {
        let byte = u8::try_from(ch).map_err(|_| Base62Error::InvalidSymbol(ch))?;
        let value = symbol_value(byte).ok_or(Base62Error::InvalidSymbol(ch))?;
        id = id
            .checked_mul(RADIX)
            .and_then(|shifted| shifted.checked_add(value))
            .ok_or(Base62Error::Overflow)?;
    }
    Ok(id)
}

pub fn is_base62(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|byte| symbol_value(byte).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_encodes_to_first_symbol() {
        assert_eq!(encode(0).unwrap(), "0");
        assert_eq!(decode("0").unwrap(), 0);
    }

    #[test]
    fn known_encodings() {
        assert_eq!(encode(9).unwrap(), "9");
        assert_eq!(encode(10).unwrap(), "A");
        assert_eq!(encode(35).unwrap(), "Z");
        assert_eq!(encode(36).unwrap(), "a");
        assert_eq!(encode(61).unwrap(), "z");
        assert_eq!(encode(62).unwrap(), "10");
        assert_eq!(encode(63).unwrap(), "11");
    }

    #[test]
    fn round_trips() {
        for id in [
            0,
            1,
            9,
            10,
            61,
            62,
            63,
            100,
            1_000,
            10_000,
            100_000,
            1_000_000,
            1_234_234_323,
            1_000_000_000_000,
            3_000_000_000_000,
            100_000_000_000_000,
            i64::MAX,
        ] {
            let code = encode(id).unwrap();
            assert_eq!(decode(&code).unwrap(), id, "id {id} code {code}");
            assert!(is_base62(&code));
        }
    }

    #[test]
    fn negative_ids_are_rejected() {
        assert_eq!(encode(-1).unwrap_err(), Base62Error::Negative(-1));
        assert_eq!(encode(i64::MIN).unwrap_err(), Base62Error::Negative(i64::MIN));
    }

    #[test]
    fn decode_rejects_bad_input() {
        assert_eq!(decode("").unwrap_err(), Base62Error::Empty);
        assert_eq!(decode("ab-c").unwrap_err(), Base62Error::InvalidSymbol('-'));
        assert_eq!(decode("idé").unwrap_err(), Base62Error::InvalidSymbol('é'));
        // One past i64::MAX ("AzL8n0Y58m7" + 1).
        assert_eq!(decode("AzL8n0Y58m8").unwrap_err(), Base62Error::Overflow);
        assert_eq!(decode("zzzzzzzzzzzz").unwrap_err(), Base62Error::Overflow);
    }

    #[test]
    fn is_base62_matches_decode() {
        assert!(is_base62("0aZ9"));
        assert!(!is_base62(""));
        assert!(!is_base62("a b"));
        assert!(!is_base62("a_b"));
    }
}
