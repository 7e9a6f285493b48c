//! Endpoint tests: the real routes mounted over in-memory fakes of the engine's trait seams.
mod catalog;
mod helpers;
mod orders;
