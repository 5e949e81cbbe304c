pub mod config;
pub mod error;
pub mod labels;
pub mod preprocess;
pub mod server;
pub mod service;
pub mod torch;
