//! Test helpers para promaxum.

#![allow(dead_code, unused_imports)]

pub mod client;
pub mod gatherers;

pub use client::{TestClient, TestResponse, client};
pub use gatherers::{Gate, failing, gated, partial, sample_registry};
