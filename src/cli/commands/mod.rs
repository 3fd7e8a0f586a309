//! Command implementations for oracle-agent CLI

pub mod config;
pub mod keygen;
pub mod list;
pub mod serve;
pub mod sign;
pub mod version;
