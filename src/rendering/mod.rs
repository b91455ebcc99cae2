pub mod context;
pub mod style;
