pub mod catalog;
pub mod geo;
