//! SellApp Core - Shared types and POS domain logic.
//!
//! This crate provides the types and calculations used across all SellApp
//! components:
//! - `web` - Server-rendered POS and back-office application
//! - `cli` - Command-line helpers for operators
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no logging. Anything that can fail because of the outside world
//! lives in the `web` crate; everything here is deterministic and testable
//! in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money and emails
//! - [`models`] - Typed views of the JSON shapes returned by the POS API
//! - [`envelope`] - The `{success, data|error}` response wrapper
//! - [`cart`] - Per-session cart with line-total invariants
//! - [`swap`] - Swap balance calculation and classification
//! - [`duplicates`] - Duplicate customer detection by normalized phone
//! - [`catalog`] - List filtering, sorting and facets
//! - [`profit_loss`] - Profit/loss breakdown tables and source totals
//! - [`sequence`] - Request sequence tickets for stale-response guards

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod duplicates;
pub mod envelope;
pub mod models;
pub mod profit_loss;
pub mod sequence;
pub mod swap;
pub mod types;

pub use types::*;
