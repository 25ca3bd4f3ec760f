pub mod api;
pub mod broadcast;
pub mod error;
pub mod protocol;
pub mod state;
pub mod types;
pub mod words;
