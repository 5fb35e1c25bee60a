//! Comment-feed auto-engagement engine.
//!
//! One generic traversal loop walks a virtualized comment feed in a real
//! browser, likes comments it has not yet processed with a
//! read-after-write confirmation, and stops once the feed stops yielding
//! anything new. Per-provider adapters supply only the structural
//! selectors; everything else is shared.

pub mod config;
pub mod engine;
pub mod execution;
pub mod links;
pub mod pipeline;
pub mod provider;
pub mod session;
pub mod view;
