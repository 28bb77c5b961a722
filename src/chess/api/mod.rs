pub mod client;
pub mod admin;
pub mod public;
pub mod upload;
