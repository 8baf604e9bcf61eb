/// Message formatting helpers (duration labels, length limits, mention neutralising).
pub mod formatting;
/// Pure parser helpers for configuration values.
pub mod parse;
