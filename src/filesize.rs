//! Filesize-suffix parsing for `--limit` (§4.9), following `du`'s
//! convention: a bare magnitude letter (`k`, `m`, ...) is the binary
//! (1024-based) multiple, and the same letter followed by `b` (`kb`, `mb`,
//! ...) is the decimal (1000-based) multiple.

use crate::error::PatchFitError;

const BINARY: u128 = 1024;
const DECIMAL: u128 = 1000;

fn suffix_multiplier(suffix: &str) -> Option<u128> {
    Some(match suffix.to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" => BINARY,
        "kb" => DECIMAL,
        "m" => BINARY.pow(2),
        "mb" => DECIMAL.pow(2),
        "g" => BINARY.pow(3),
        "gb" => DECIMAL.pow(3),
        "t" => BINARY.pow(4),
        "tb" => DECIMAL.pow(4),
        "p" => BINARY.pow(5),
        "pb" => DECIMAL.pow(5),
        "e" => BINARY.pow(6),
        "eb" => DECIMAL.pow(6),
        "z" => BINARY.pow(7),
        "zb" => DECIMAL.pow(7),
        "y" => BINARY.pow(8),
        "yb" => DECIMAL.pow(8),
        _ => return None,
    })
}

/// Parses a filesize specification like `"64k"` or `"1.5gb"`'s integer
/// cousin `"1gb"` into a byte count. The numeric part must be a plain
/// non-negative integer; fractional sizes are not supported, matching
/// `original_source`'s `int(number) * suffixes[suffix]`.
pub fn parse_filesize(s: &str) -> Result<u128, PatchFitError> {
    let split_at = s
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(s.len());
    let (number_part, suffix) = s.split_at(split_at);
    let number: u128 = number_part
        .parse()
        .map_err(|_| PatchFitError::InvalidFilesize(s.to_string()))?;
    let multiplier =
        suffix_multiplier(suffix).ok_or_else(|| PatchFitError::InvalidFilesize(s.to_string()))?;
    number
        .checked_mul(multiplier)
        .ok_or_else(|| PatchFitError::InvalidFilesize(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s9_binary_vs_decimal_suffixes() {
        assert_eq!(parse_filesize("64k").unwrap(), 65536);
        assert_eq!(parse_filesize("64kb").unwrap(), 64000);
        assert_eq!(parse_filesize("1m").unwrap(), 1_048_576);
        assert_eq!(parse_filesize("1mb").unwrap(), 1_000_000);
    }

    #[test]
    fn bare_number_means_bytes() {
        assert_eq!(parse_filesize("512").unwrap(), 512);
        assert_eq!(parse_filesize("512b").unwrap(), 512);
    }

    #[test]
    fn case_insensitive_suffix() {
        assert_eq!(parse_filesize("2G").unwrap(), parse_filesize("2g").unwrap());
        assert_eq!(parse_filesize("2GB").unwrap(), parse_filesize("2gb").unwrap());
    }

    #[test]
    fn rejects_missing_number_and_unknown_suffix() {
        assert!(parse_filesize("k").is_err());
        assert!(parse_filesize("12q").is_err());
        assert!(parse_filesize("").is_err());
    }
}
