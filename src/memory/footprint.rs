/*!
 * Footprint Estimation
 *
 * Static cost proxy for a script's structural complexity. Used as an
 * admission-control heuristic, not as a measurement of real memory use.
 */

use crate::core::types::Footprint;

/// Weight of a character absent from the table
const DEFAULT_WEIGHT: Footprint = 1;

#[inline]
fn char_weight(c: char) -> Footprint {
    match c {
        '+' | '-' | '*' | '/' | '%' => 4,
        '(' => 8,
        '{' => 16,
        '[' => 32,
        '"' | '`' | '\'' => 128,
        _ => DEFAULT_WEIGHT,
    }
}

/// Estimate the virtual footprint of `source`
///
/// One pass, one weight per character. Total over any input; the empty
/// string costs 0.
///
/// A character is a Unicode scalar value, so a character outside the Basic
/// Multilingual Plane (an emoji, say) costs 1, not one per UTF-16 unit.
pub fn estimate(source: &str) -> Footprint {
    source.chars().map(char_weight).sum()
}
