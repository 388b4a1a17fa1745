//! Command implementations

pub mod check;
pub mod fingerprint;
pub mod mime_types;
