//! Wire and domain types shared between the blog client crates.

pub mod domain;
pub mod error;
pub mod protocol;
