pub mod config;
pub mod data_importer;
pub mod error;
pub mod maintenance;
pub mod source;
pub mod store;
pub mod types;
