//! Integration tests for sumi-harvest

mod client_tests;
mod crawl_tests;
mod support;
