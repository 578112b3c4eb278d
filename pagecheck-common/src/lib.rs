//! Common utilities shared across pagecheck crates.
//!
//! Kept intentionally small so every crate in the workspace can depend on it
//! without pulling in the storage or HTTP stacks.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`clamp_chars`] and [`MAX_TEXT_CHARS`]: the length cap applied to
//!   extracted `h1`/`title` text before it is persisted
//!
//! # Examples
//!
//! ```rust
//! use pagecheck_common::{clamp_chars, MAX_TEXT_CHARS};
//!
//! let long = "x".repeat(300);
//! assert_eq!(clamp_chars(&long, MAX_TEXT_CHARS).chars().count(), 255);
//! ```

pub mod observability;

/// Upper bound (in characters) for stored `h1` and `title` values.
pub const MAX_TEXT_CHARS: usize = 255;

/// Truncate `s` to at most `max` characters, never splitting a code point.
pub fn clamp_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Owned variant of [`clamp_chars`] for optional fields.
pub fn clamp_opt(value: Option<String>, max: usize) -> Option<String> {
    value.map(|mut s| {
        let keep = clamp_chars(&s, max).len();
        s.truncate(keep);
        s
    })
}
