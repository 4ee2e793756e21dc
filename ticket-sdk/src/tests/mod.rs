//! Unit tests for the ticket SDK
//!
//! This module contains tests for various components of the SDK.

pub mod error_tests;
