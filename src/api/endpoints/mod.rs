//! API endpoint handlers.
//!
//! Handlers stay thin; the screening logic lives in `crate::screening`.

pub mod health;
pub mod predict;
