//! Base64 payload decoding
//!
//! Link payloads in the wild come in every Base64 flavour: standard or
//! URL-safe alphabet, with or without `=` padding, sometimes wrapped across
//! lines. Each engine is tried in turn until one accepts the input.

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::GeneralPurpose;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use tracing::trace;

/// Engines in the order they are attempted
const ENGINES: [(&str, &GeneralPurpose); 4] = [
    ("standard", &STANDARD),
    ("URL-safe", &URL_SAFE),
    ("standard unpadded", &STANDARD_NO_PAD),
    ("URL-safe unpadded", &URL_SAFE_NO_PAD),
];

/// Decodes Base64 content, trying every alphabet and padding variant
///
/// Whitespace is stripped first. If no engine accepts the input as is, the
/// padded engines are tried again after repairing the padding.
pub fn decode_base64(content: &str) -> Result<Vec<u8>> {
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();

    for (label, engine) in ENGINES {
        if let Ok(decoded) = engine.decode(&cleaned) {
            trace!("Decoded {} bytes as {} Base64", decoded.len(), label);
            return Ok(decoded);
        }
    }

    let padded = add_base64_padding(cleaned.trim_end_matches('='));
    for (label, engine) in [("standard", &STANDARD), ("URL-safe", &URL_SAFE)] {
        if let Ok(decoded) = engine.decode(&padded) {
            trace!("Decoded {} bytes as {} Base64 after repairing padding", decoded.len(), label);
            return Ok(decoded);
        }
    }

    bail!("Invalid Base64 payload")
}

/// Decodes a Base64 payload that must hold UTF-8 text
pub fn decode_base64_text(content: &str) -> Result<String> {
    let bytes = decode_base64(content)?;
    String::from_utf8(bytes).context("Decoded payload is not valid UTF-8")
}

/// Pads a Base64 string with `=` up to a multiple of four characters
pub fn add_base64_padding(s: &str) -> String {
    let mut result = s.to_string();
    while !result.len().is_multiple_of(4) {
        result.push('=');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_standard() {
        let decoded = decode_base64("aGVsbG8gd29ybGQ=").unwrap();
        assert_eq!(decoded, b"hello world");
    }

    #[test]
    fn test_decode_url_safe() {
        // 0xfb 0xff encodes to "+/8=" in standard and "-_8=" in URL-safe
        assert_eq!(decode_base64("-_8=").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_base64("-_8").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_decode_without_padding() {
        let decoded = decode_base64("aGVsbG8gd29ybGQ").unwrap();
        assert_eq!(decoded, b"hello world");
    }

    #[test]
    fn test_decode_with_excess_padding() {
        let decoded = decode_base64("aGVsbG8gd29ybGQ===").unwrap();
        assert_eq!(decoded, b"hello world");
    }

    #[test]
    fn test_decode_with_line_breaks() {
        let decoded = decode_base64("aGVs\nbG8g\r\nd29y\tbGQ=").unwrap();
        assert_eq!(decoded, b"hello world");
    }

    #[test]
    fn test_decode_invalid() {
        assert!(decode_base64("not valid base64!!!").is_err());
    }

    #[test]
    fn test_decode_text_rejects_invalid_utf8() {
        // 0xff 0xfe
        let err = decode_base64_text("//4=").unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_add_padding() {
        assert_eq!(add_base64_padding("abcd"), "abcd");
        assert_eq!(add_base64_padding("abc"), "abc=");
        assert_eq!(add_base64_padding("ab"), "ab==");
        assert_eq!(add_base64_padding(""), "");
    }
}
