pub mod manager;
pub mod overlay;
pub mod selection;
pub mod symbol;
