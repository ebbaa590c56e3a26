//! Binary-coded decimal conversion.
//!
//! BCD values store one decimal digit per nibble, so `0x2023` reads as the
//! decimal year 2023.

/// Re-render the digits of `value` in `input_base` as a number in `output_base`.
///
/// Digits are extracted least significant first. Digits that are not valid in
/// the output base produce meaningless results. Returns `None` if the result
/// does not fit in a `u64`.
pub fn convert(mut value: u64, input_base: u64, output_base: u64) -> Option<u64> {
    let mut ret: u64 = 0;
    let mut weight: u64 = 1;
    while value != 0 {
        let digit = value % input_base;
        value /= input_base;
        ret = ret.checked_add(digit.checked_mul(weight)?)?;
        if value != 0 {
            weight = weight.checked_mul(output_base)?;
        }
    }
    Some(ret)
}

/// Decode a BCD value (`0x2023` -> `2023`).
pub fn decode(value: u64) -> u64 {
    // Sixteen nibbles read as decimal digits stay below 2^64.
    convert(value, 16, 10).unwrap_or_default()
}

/// Encode a value as BCD (`2023` -> `0x2023`).
///
/// Returns `None` for values with more than sixteen decimal digits.
pub fn encode(value: u64) -> Option<u64> {
    convert(value, 10, 16)
}
