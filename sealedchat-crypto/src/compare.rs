//! Constant-time comparison.

use subtle::ConstantTimeEq;

/// Compares two byte strings without short-circuiting on the first
/// difference. Inputs of different length compare unequal; only the length
/// itself is observable through timing.
pub fn secure_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
