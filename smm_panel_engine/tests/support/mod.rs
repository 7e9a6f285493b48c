//! Shared fixtures for the behavior tests. The fakes themselves live in the library's `test_utils` module so
//! the server crate's endpoint tests can drive the same seams.
#![allow(unused_imports)]

pub use smm_panel_engine::test_utils::fakes::{reel_views, FakeLedger, FakePanel, FakeRates, FakeStore};
