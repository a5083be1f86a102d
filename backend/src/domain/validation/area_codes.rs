//! Whitelist of two-digit domestic area codes.

use std::collections::HashSet;
use std::sync::OnceLock;

const AREA_CODES: &[u8] = &[
    11, 12, 13, 14, 15, 16, 17, 18, 19, //
    21, 22, 24, 27, 28, //
    31, 32, 33, 34, 35, 37, 38, //
    41, 42, 43, 44, 45, 46, 47, 48, 49, //
    51, 53, 54, 55, //
    61, 62, 63, 64, 65, 66, 67, 68, 69, //
    71, 73, 74, 75, 77, 79, //
    81, 82, 83, 84, 85, 86, 87, 88, 89, //
    91, 92, 93, 94, 95, 96, 97, 98, 99,
];

static KNOWN: OnceLock<HashSet<u8>> = OnceLock::new();

fn known() -> &'static HashSet<u8> {
    KNOWN.get_or_init(|| AREA_CODES.iter().copied().collect())
}

/// Whether `code` is exactly two ASCII digits naming a whitelisted area.
pub fn is_known_area_code(code: &str) -> bool {
    if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    code.parse::<u8>()
        .is_ok_and(|value| known().contains(&value))
}
