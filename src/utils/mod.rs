//! Utilities.

pub mod gas;
