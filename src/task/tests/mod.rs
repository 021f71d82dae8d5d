//! Unit tests for the task lifecycle engine.

mod domain_tests;
mod support;
