//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! Terraform CLI adapter, the Compute API client, workdir preparation, and
//! suite/environment loading.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod auth;
pub mod command_runner;
pub mod compute;
pub mod config;
pub mod terraform;
pub mod workdir;
