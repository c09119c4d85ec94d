//! Tests for the interpreter
//!
//! Organized by feature area

mod async_tests;
mod basic_tests;
mod class_tests;
mod helpers;
mod stdlib_tests;
