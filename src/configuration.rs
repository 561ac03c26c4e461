//! src/configuration.rs
use crate::error::EngineError;
use crate::tokenizer::TokenPolicy;
use serde_aux::field_attributes::deserialize_number_from_string;
use std::path::PathBuf;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub job: JobSettings,
    pub engine: EngineSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct JobSettings {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct EngineSettings {
    pub mapper_variant: MapperVariant,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub reducer_count: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_split_size_bytes: u64,
    pub memory_threshold: f64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub spill_check_interval: u64,
    #[serde(default)]
    pub token_policy: TokenPolicy,
}

impl EngineSettings {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.reducer_count == 0 {
            return Err(EngineError::Config(
                "reducer_count must be at least 1".into(),
            ));
        }
        if self.max_split_size_bytes == 0 {
            return Err(EngineError::Config(
                "max_split_size_bytes must be greater than 0".into(),
            ));
        }
        if !(self.memory_threshold > 0.0 && self.memory_threshold <= 1.0) {
            return Err(EngineError::Config(format!(
                "memory_threshold must be in (0, 1], got {}",
                self.memory_threshold
            )));
        }
        if self.spill_check_interval == 0 {
            return Err(EngineError::Config(
                "spill_check_interval must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// The four pipeline configurations, selected as data rather than by
/// pluggable classes.
#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapperVariant {
    #[serde(rename = "simple")]
    Simple,
    #[serde(rename = "simple+combiner")]
    SimpleWithCombiner,
    #[serde(rename = "inmapper-combine")]
    InMapperCombine,
    #[serde(rename = "inmapper-combine+combiner")]
    InMapperCombineWithCombiner,
}

impl MapperVariant {
    pub fn combines_in_mapper(&self) -> bool {
        matches!(
            self,
            MapperVariant::InMapperCombine | MapperVariant::InMapperCombineWithCombiner
        )
    }

    pub fn uses_external_combiner(&self) -> bool {
        matches!(
            self,
            MapperVariant::SimpleWithCombiner | MapperVariant::InMapperCombineWithCombiner
        )
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory.");
    let config_dir = base_path.join("configuration");

    let settings = config::Config::builder()
        .add_source(config::File::from(config_dir.join("engine.yaml")))
        .add_source(
            config::Environment::with_prefix("INVINDEX")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
