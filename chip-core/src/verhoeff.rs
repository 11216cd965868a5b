//! Verhoeff check digit calculation for decimal strings
//!
//! The check digit detects every single-digit error and every transposition
//! of adjacent digits, which makes it a good fit for codes typed by hand.

use crate::error::{ChipError, ChipResult};

/// Number of symbols (decimal digits)
const BASE: usize = 10;

/// Order of the rotation subgroup of the dihedral group D5
const POLYGON_SIZE: u8 = 5;

/// Multiplication table of the dihedral group D5
static MULTIPLY_TABLE: [[u8; BASE]; BASE] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 2, 3, 4, 0, 6, 7, 8, 9, 5],
    [2, 3, 4, 0, 1, 7, 8, 9, 5, 6],
    [3, 4, 0, 1, 2, 8, 9, 5, 6, 7],
    [4, 0, 1, 2, 3, 9, 5, 6, 7, 8],
    [5, 9, 8, 7, 6, 0, 4, 3, 2, 1],
    [6, 5, 9, 8, 7, 1, 0, 4, 3, 2],
    [7, 6, 5, 9, 8, 2, 1, 0, 4, 3],
    [8, 7, 6, 5, 9, 3, 2, 1, 0, 4],
    [9, 8, 7, 6, 5, 4, 3, 2, 1, 0],
];

/// Position-dependent permutation
static PERMUTATION_TABLE: [u8; BASE] = [1, 5, 7, 6, 2, 8, 3, 0, 9, 4];

/// Apply the permutation `count` times to `value`
fn permute(value: u8, count: usize) -> u8 {
    // The permutation has order 8.
    (0..count % 8).fold(value, |v, _| PERMUTATION_TABLE[v as usize])
}

/// Inverse of `value` in D5
fn dihedral_invert(value: u8) -> u8 {
    if value > 0 && value < POLYGON_SIZE {
        POLYGON_SIZE - value
    } else {
        value
    }
}

fn digit_value(c: char) -> ChipResult<u8> {
    c.to_digit(BASE as u32)
        .map(|d| d as u8)
        .ok_or_else(|| ChipError::InvalidArgument(format!("Invalid decimal digit '{}'", c)))
}

/// Compute the check digit for a string of decimal digits
///
/// # Errors
///
/// Returns `ChipError::InvalidArgument` if `digits` contains a non-digit character.
pub fn compute_check_char(digits: &str) -> ChipResult<char> {
    let mut checksum = 0u8;
    for (i, c) in digits.chars().rev().enumerate() {
        let p = permute(digit_value(c)?, i + 1);
        checksum = MULTIPLY_TABLE[checksum as usize][p as usize];
    }
    Ok(char::from(b'0' + dihedral_invert(checksum)))
}

/// Check that `check_char` is the check digit of `digits`
///
/// Returns `false` for any non-digit input rather than an error.
pub fn validate_check_char(check_char: char, digits: &str) -> bool {
    matches!(compute_check_char(digits), Ok(expected) if expected == check_char)
}

/// Check a string whose last character is its own check digit
pub fn validate(digits_with_check: &str) -> bool {
    let mut chars = digits_with_check.chars();
    match chars.next_back() {
        Some(check_char) => validate_check_char(check_char, chars.as_str()),
        None => false,
    }
}
