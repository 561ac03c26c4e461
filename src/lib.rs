//! src/lib.rs
pub mod combiner;
pub mod configuration;
pub mod error;
pub mod mapper;
pub mod memory;
pub mod pipeline;
pub mod reducer;
pub mod shuffle;
pub mod split_reader;
pub mod telemetry;
pub mod tokenizer;
#[cfg(test)]
mod test_utils;
