//! Hex dumps for diagnostics.
use rustc_hex::ToHex;

/// Default number of hex characters per line.
pub const DEFAULT_WIDTH: usize = 64;

/// Split the lowercase hex encoding of `data` into lines of `width` characters.
pub fn hexdump(data: &[u8], width: usize) -> Vec<String> {
    let hex: String = data.to_hex();
    hex.as_bytes()
        .chunks(width.max(1))
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .collect()
}
