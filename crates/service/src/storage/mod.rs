//! Storage abstractions for service layer
//!
//! `MapStore` backs the in-memory repositories, optionally persisted as a
//! JSON snapshot so the memory backend survives restarts.

pub mod map_store;

pub use map_store::MapStore;
