// Pipeline processing: record building, merging and validation

pub mod builder;
pub mod deadline;
pub mod extract;
pub mod merge;
pub mod schema;
pub mod validate;
