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

//! dbctl client configuration, loaded from TOML.

use crate::infrastructure::constants::{
    CONFIG_ENV, DEFAULT_ACCESS_METHOD, DEFAULT_CONFIG_PATH, DEFAULT_NAMESPACE,
    DEFAULT_PV_RECLAIM_POLICY,
};
use crate::shared::error::{CtlError, Result};
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CtlConf {
    #[serde(flatten)]
    pub kubernetes: KubernetesConf,
    pub backup_repo: BackupRepoConf,
}

/// Where to reach the cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KubernetesConf {
    /// Namespace for credential secrets.
    pub namespace: String,
    pub kubeconfig: Option<String>,
    pub context: Option<String>,
}

impl Default for KubernetesConf {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            kubeconfig: None,
            context: None,
        }
    }
}

/// Defaults for `backup-repo create`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackupRepoConf {
    pub access_method: String,
    pub pv_reclaim_policy: String,
}

impl Default for BackupRepoConf {
    fn default() -> Self {
        Self {
            access_method: DEFAULT_ACCESS_METHOD.to_string(),
            pv_reclaim_policy: DEFAULT_PV_RECLAIM_POLICY.to_string(),
        }
    }
}

impl CtlConf {
    /// Load configuration from a TOML file.
    pub fn from<T: AsRef<Path>>(path: T) -> Result<Self> {
        let path = path.as_ref();
        let content = read_to_string(path).map_err(|e| {
            CtlError::config_error(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let conf: Self = toml::from_str(&content)?;
        Ok(conf)
    }

    /// Resolve the configuration file: an explicit path, then `$DBCTL_CONFIG`,
    /// then `~/.dbctl/config.toml` if present. Without any of them the
    /// built-in defaults apply.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from(path);
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return Self::from(path);
            }
        }
        match default_path() {
            Some(path) if path.exists() => Self::from(path),
            _ => {
                debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Command-line values win over the file.
    pub fn apply_overrides(
        &mut self,
        namespace: Option<&str>,
        kubeconfig: Option<&str>,
        context: Option<&str>,
    ) {
        if let Some(namespace) = namespace {
            self.kubernetes.namespace = namespace.to_string();
        }
        if let Some(kubeconfig) = kubeconfig {
            self.kubernetes.kubeconfig = Some(kubeconfig.to_string());
        }
        if let Some(context) = context {
            self.kubernetes.context = Some(context.to_string());
        }
    }
}

fn default_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(DEFAULT_CONFIG_PATH))
}
