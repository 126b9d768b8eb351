//! Logic for loading configuration in to an object model

use std::str::FromStr;

use displaydoc::Display;
use schemars::gen::SchemaSettings;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// {message}: {error}
    InvalidConfiguration {
        /// What was being done.
        message: &'static str,
        /// The underlying error.
        error: String,
    },
}

/// The configuration of an [`Executor`](crate::Executor).
///
/// Can be created through `serde::Deserialize` from various formats, from YAML with
/// [`Configuration::from_yaml`], or inline in Rust code with [`Configuration::builder`].
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Configuration {
    /// Limits on the shape of executed operations.
    pub limits: Limits,

    /// Execution behaviour.
    pub execution: Execution,
}

/// Limits on the shape of executed operations, measured after fields are merged.
///
/// Every limit is disabled by default.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Limits {
    /// The deepest nesting of fields.
    pub max_depth: Option<u32>,

    /// The number of distinct fields, at any depth.
    pub max_height: Option<u32>,

    /// The number of fields of the operation's root selection.
    pub max_root_fields: Option<u32>,

    /// The number of aliased fields.
    pub max_aliases: Option<u32>,

    /// Log operations exceeding a limit instead of rejecting them.
    /// default: false
    pub warn_only: bool,
}

/// Execution behaviour.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Execution {
    /// Leave out fields whose type condition the object is not compatible with, instead of
    /// failing the execution.
    /// default: false
    pub skip_inapplicable_fields: bool,

    /// Resolve `__typename` to the kind of objects which do not define it themselves.
    /// default: true
    pub typename: bool,
}

impl Default for Execution {
    fn default() -> Self {
        Self {
            skip_inapplicable_fields: false,
            typename: true,
        }
    }
}

#[buildstructor::buildstructor]
impl Configuration {
    #[builder]
    pub fn new(limits: Option<Limits>, execution: Option<Execution>) -> Self {
        Self {
            limits: limits.unwrap_or_default(),
            execution: execution.unwrap_or_default(),
        }
    }

    /// Parses a YAML configuration. An empty document gives the default configuration.
    pub fn from_yaml(raw_yaml: &str) -> Result<Self, ConfigurationError> {
        if raw_yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw_yaml).map_err(|e| ConfigurationError::InvalidConfiguration {
            message: "failed to parse configuration",
            error: e.to_string(),
        })
    }
}

impl FromStr for Configuration {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_yaml(s)
    }
}

#[buildstructor::buildstructor]
impl Limits {
    #[builder]
    pub fn new(
        max_depth: Option<u32>,
        max_height: Option<u32>,
        max_root_fields: Option<u32>,
        max_aliases: Option<u32>,
        warn_only: Option<bool>,
    ) -> Self {
        Self {
            max_depth,
            max_height,
            max_root_fields,
            max_aliases,
            warn_only: warn_only.unwrap_or_default(),
        }
    }
}

#[buildstructor::buildstructor]
impl Execution {
    #[builder]
    pub fn new(skip_inapplicable_fields: Option<bool>, typename: Option<bool>) -> Self {
        let default = Self::default();
        Self {
            skip_inapplicable_fields: skip_inapplicable_fields
                .unwrap_or(default.skip_inapplicable_fields),
            typename: typename.unwrap_or(default.typename),
        }
    }
}

/// Generate a JSON schema for the configuration.
pub fn generate_config_schema() -> RootSchema {
    let settings = SchemaSettings::draft07().with(|s| {
        s.option_nullable = true;
        s.option_add_null_type = false;
        s.inline_subschemas = true;
    });
    settings
        .into_generator()
        .into_root_schema_for::<Configuration>()
}
