//! Legend values a map can show next to its symbols

pub mod format;
pub mod resolver;
