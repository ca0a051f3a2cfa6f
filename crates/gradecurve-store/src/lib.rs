//! gradecurve-store: Configuration and persistence collaborators.
//!
//! Implements the `GradeStore` and `PolicySource` traits from
//! `gradecurve-core` with an in-memory store, a JSON file store, and a
//! TOML-configured policy source.

pub mod config;
pub mod json;
pub mod memory;

pub use config::{
    create_store, load_config, load_config_from, ConfigPolicySource, GradecurveConfig, StoreConfig,
};
pub use json::JsonFileStore;
pub use memory::MemoryStore;
