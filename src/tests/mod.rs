//! Scenario tests for the SkyPath binary.
