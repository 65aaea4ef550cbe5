//! Configuration types for the mxmend pipeline.
//!
//! Every section implements [`serde::Deserialize`] and falls back to its
//! defaults when absent, so an empty configuration file is valid.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration, one section per stage.
//! - [`SanitizeConfig`] - Values filled in for missing geometry.
//! - [`RepairConfig`] - Bound on the attribute repair passes.
//! - [`ValidateConfig`] - Semantic zone rules.
//! - [`ResolveConfig`] - Margin left between resolved nodes.
//! - [`MergeConfig`] - Id stride and handling of non-numeric ids.
//!
//! # Example
//!
//! ```
//! # use mxmend::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.repair().max_passes(), 16);
//! assert_eq!(config.resolve().margin(), 10.0);
//! assert_eq!(config.merge().stride(), 100);
//! ```

use serde::Deserialize;

use mxmend_core::document::GeometryDefaults;

pub use crate::{merge::MergeConfig, resolve::ResolveConfig, validate::ValidateConfig};
pub use mxmend_parser::repair::RepairConfig;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    repair: RepairConfig,

    #[serde(default)]
    sanitize: SanitizeConfig,

    #[serde(default)]
    validate: ValidateConfig,

    #[serde(default)]
    resolve: ResolveConfig,

    #[serde(default)]
    merge: MergeConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        repair: RepairConfig,
        sanitize: SanitizeConfig,
        validate: ValidateConfig,
        resolve: ResolveConfig,
        merge: MergeConfig,
    ) -> Self {
        Self {
            repair,
            sanitize,
            validate,
            resolve,
            merge,
        }
    }

    pub fn repair(&self) -> &RepairConfig {
        &self.repair
    }

    pub fn sanitize(&self) -> &SanitizeConfig {
        &self.sanitize
    }

    pub fn validate(&self) -> &ValidateConfig {
        &self.validate
    }

    pub fn resolve(&self) -> &ResolveConfig {
        &self.resolve
    }

    pub fn merge(&self) -> &MergeConfig {
        &self.merge
    }
}

/// Geometry completion settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SanitizeConfig {
    /// Values used for missing `x`, `y`, `width` and `height` fields.
    #[serde(default)]
    geometry: GeometryDefaults,
}

impl SanitizeConfig {
    pub fn new(geometry: GeometryDefaults) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &GeometryDefaults {
        &self.geometry
    }
}
