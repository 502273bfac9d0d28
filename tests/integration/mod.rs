//! Integration tests for the sitequery client

mod client_queries;
mod logging_init;
mod retry_behavior;
