//! Unit tests for provcheck
//!
//! These tests use mocked dependencies and run fast without external I/O.

mod scenario_runner;
