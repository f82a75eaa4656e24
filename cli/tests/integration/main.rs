//! Integration tests for provcheck
//!
//! These tests spawn real processes (the binary, the fake terraform script)
//! and talk HTTP to a local Compute stub. They are slower and should be run
//! separately from unit tests.

mod cli_tests;
#[cfg(unix)]
mod fake_terraform;
