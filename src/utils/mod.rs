//! Pure utility functions.
//!
//! These are stateless helpers shared by both handlers.

pub mod bootstrap;
pub mod retry;
