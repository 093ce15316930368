//! pkpanel: search, install and remove system packages through a
//! PackageKit-style package service, with a cached view of the installed set.
//!
//! Library entry exposing the core logic for the binary and integration tests.

pub mod app;
pub mod args;
pub mod config;
pub mod error;
pub mod events;
pub mod index;
pub mod install;
pub mod logic;
pub mod privilege;
pub mod sources;
pub mod state;
