pub mod duration;
pub mod error;
pub mod models;
pub mod retry;
pub mod settings;
pub mod store;
