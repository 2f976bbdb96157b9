pub mod assets;
pub mod line_store;
