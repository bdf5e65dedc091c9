//! Integration tests
//!
//! `api_routes` and `realtime` run in-process against the in-memory store;
//! `live_api` is `#[ignore]`d and needs a running server.

mod api_routes;
mod common;
mod live_api;
mod realtime;
