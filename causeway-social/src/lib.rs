//! Social network integrations for Causeway.
//!
//! Only the Twitter search pipeline is implemented: a v1.1 search client with
//! a cached OAuth2 bearer token, and a polling wrapper that exposes matches
//! as a continuous stream.
pub mod twitter;
