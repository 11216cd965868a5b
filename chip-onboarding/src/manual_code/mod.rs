//! Manual pairing codes
//!
//! A short code is 11 digits: chunk 1 (1 digit), chunk 2 (5 digits),
//! chunk 3 (4 digits) and a Verhoeff check digit. A long code inserts the
//! vendor id and product id (5 digits each) before the check digit and is
//! used whenever the commissioning flow is not standard.

pub mod generator;
pub mod parser;

pub use generator::ManualCodeGenerator;
pub use parser::ManualCodeParser;

use crate::constants::MANUAL_CODE_SEPARATOR;

/// Formats a code in its conventional dashed grouping
///
/// Short codes read `DDDD-DDD-DDDD`, long codes `DDDD-DDD-DDDD-DDDDD-DDDDD`.
pub fn format_dashed(code: &str) -> String {
    let groups: &[usize] = if code.len() > 11 { &[4, 3, 4, 5, 5] } else { &[4, 3, 4] };
    let mut out = String::with_capacity(code.len() + groups.len());
    let mut rest = code;
    for (i, width) in groups.iter().enumerate() {
        if rest.is_empty() {
            break;
        }
        if i > 0 {
            out.push(MANUAL_CODE_SEPARATOR);
        }
        let (head, tail) = rest.split_at((*width).min(rest.len()));
        out.push_str(head);
        rest = tail;
    }
    out.push_str(rest);
    out
}
