// Copyright 2025 dbctl Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::params::ValidationErrors;
use thiserror::Error;
pub type Result<T> = std::result::Result<T, CtlError>;

#[derive(Error, Debug)]
pub enum CtlError {
    #[error("Kubernetes API error: {0}")]
    KubeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to fetch schema: {0}")]
    SchemaFetch(String),

    #[error("Unsupported schema at '{path}': {reason}")]
    UnsupportedSchema { path: String, reason: String },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid parameters:\n{0}")]
    Validation(ValidationErrors),

    #[error("Flag error: {0}")]
    Flag(String),

    #[error("Resource not found: {resource_type} '{name}'")]
    NotFound { resource_type: String, name: String },

    #[error("Resource already exists: {resource_type} '{name}'")]
    AlreadyExists { resource_type: String, name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<kube::Error> for CtlError {
    fn from(err: kube::Error) -> Self {
        CtlError::KubeError(err.to_string())
    }
}

impl CtlError {
    pub fn config_error(context: impl Into<String>) -> Self {
        Self::ConfigError(context.into())
    }

    pub fn unsupported(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedSchema {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    pub fn already_exists(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    /// Translate a kube API error for a named resource, keeping 404/409 distinguishable.
    pub fn from_api(err: kube::Error, resource_type: &str, name: &str) -> Self {
        match err {
            kube::Error::Api(ae) if ae.code == 404 => Self::not_found(resource_type, name),
            kube::Error::Api(ae) if ae.code == 409 => Self::already_exists(resource_type, name),
            e => Self::KubeError(format!("{} '{}': {}", resource_type, name, e)),
        }
    }
}
