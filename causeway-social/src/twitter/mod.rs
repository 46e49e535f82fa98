//! Twitter v1.1 search integration.
//!
//! Submodules provide the API client (bearer-token cache plus search page
//! fetches), the strongly typed response models, and the polling wrapper
//! that turns repeated searches into one continuous tweet stream.
pub mod client;
pub mod search;
pub mod types;

pub use client::TwitterApi;
pub use search::{search, search_every};
