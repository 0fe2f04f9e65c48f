//! Common functionality for the bid adapter.
//!
//! This crate turns a batch of per-slot bid requests into a single request to
//! the ad server and turns the server's reply back into bid results the host
//! auction can rank and render. Sending the request is left to the host.
//!
//! # Modules
//!
//! - [`adapter`]: The bidder seam the host auction registers
//! - [`consent`]: GDPR/GPP consent aggregation with regulatory fallbacks
//! - [`constants`]: Wire keys, defaults and sentinels
//! - [`error`]: Error types and error handling utilities
//! - [`origin`]: Referer and ancestor origin chain derivation
//! - [`request`]: Outbound payload and request assembly
//! - [`request_id`]: Request ID generation and logging helpers
//! - [`response`]: Server response interpretation
//! - [`settings`]: Configuration management and validation
//! - [`sizes`]: Ad slot size normalization
//! - [`targeting`]: Page-level targeting overrides
//! - [`test_support`]: Testing utilities and fixtures

pub mod adapter;
pub mod consent;
pub mod constants;
pub mod error;
pub mod origin;
pub mod request;
pub mod request_id;
pub mod response;
pub mod settings;
pub mod sizes;
pub mod targeting;
