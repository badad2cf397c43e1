use std::fmt::Write;

/// Lowercase hex rendering of a key for log lines.
pub fn hex(src: &[u8]) -> String {
    let mut out = String::with_capacity(src.len() * 2);
    for x in src {
        let _ = write!(out, "{:02x}", x);
    }
    out
}
