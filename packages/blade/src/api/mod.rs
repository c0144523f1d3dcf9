//! Fluent hashing API
//!
//! Actions take data as arguments:
//! `Blade::hash().on_result(handler).compute(data).await`

pub mod blade_builder;

pub use blade_builder::{BladeBuilder, BladeWithHandler};
