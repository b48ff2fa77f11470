pub mod config;
pub mod fetch;
pub mod process;
pub mod sheet;
