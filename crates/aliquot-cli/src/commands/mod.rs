//! CLI command implementations.

pub mod actions;
pub mod check;
pub mod common;
pub mod plates;
pub mod show;
pub mod split;
pub mod transfers;
pub mod volumes;
