//! Route handlers other than `/metrics`.

pub mod health;
