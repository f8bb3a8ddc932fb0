//! Structural comparison of mapping sets.
//!
//! Used to check that two loads of the same source agree. Bodies are compared
//! as JSON values when both sides parse, so insignificant whitespace does not
//! count as a difference; anything else falls back to a byte comparison.

use serde_json::Value;

use crate::mapping::types::{MappingRecord, MockResponse, RawBody};

/// Returns true if both slices describe the same mappings in the same order.
pub fn mappings_equal(a: &[MappingRecord], b: &[MappingRecord]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| record_equal(x, y))
}

fn record_equal(a: &MappingRecord, b: &MappingRecord) -> bool {
    a.path == b.path && a.method.eq_ignore_ascii_case(&b.method) && response_equal(&a.response, &b.response)
}

fn response_equal(a: &MockResponse, b: &MockResponse) -> bool {
    a.status_code == b.status_code
        && a.headers == b.headers
        && match (&a.body, &b.body) {
            (None, None) => true,
            (Some(x), Some(y)) => body_equal(x, y),
            _ => false,
        }
}

fn body_equal(a: &RawBody, b: &RawBody) -> bool {
    match (canonical(a), canonical(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a.as_bytes() == b.as_bytes(),
    }
}

fn canonical(body: &RawBody) -> Option<Value> {
    serde_json::from_slice(body.as_bytes()).ok()
}
