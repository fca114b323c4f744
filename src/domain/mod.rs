pub mod boq;
pub mod error;
pub mod grid;
pub mod mapping_config;
