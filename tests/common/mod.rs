#![allow(dead_code)]

pub mod fixtures;

pub use quantflow_test_utils::init_tracing;
