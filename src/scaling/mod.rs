pub mod applier;
pub mod calculator;
