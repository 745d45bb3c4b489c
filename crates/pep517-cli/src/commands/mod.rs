//! CLI command implementations

pub mod doctor;
pub mod hooks;
