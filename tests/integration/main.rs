//! Integration tests against mock AppView servers

mod client_tests;
mod crawl_tests;
