//! Cross-crate scenarios.

pub mod choreography;
pub mod concurrency;
pub mod order_flows;
pub mod settlement;
