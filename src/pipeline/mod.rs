// Aggregation pipeline: processing stages and the run orchestration

pub mod aggregate;
pub mod processing;

pub use aggregate::{AggregationOptions, AggregationPipeline, AggregationReport};
