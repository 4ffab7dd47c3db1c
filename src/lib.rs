//! Wayfarer — nearby-places search for a travel assistant.
//!
//! A generative-AI oracle suggests places for a free-text query; Wayfarer
//! parses its output defensively, attaches great-circle distances from the
//! user, and produces a de-duplicated, filtered, ordered list for display.

pub mod config;
pub mod location;
pub mod oracle;
pub mod places;
pub mod search;
pub mod server;
