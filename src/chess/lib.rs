pub mod types;
pub mod constants;
pub mod data_types;
pub mod utils;
pub mod api;
pub mod web;
pub mod bio;
