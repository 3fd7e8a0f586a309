//! Filesystem helpers

pub mod socket;
