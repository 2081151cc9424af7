//! Cross-module integration tests

mod physics_integration;
