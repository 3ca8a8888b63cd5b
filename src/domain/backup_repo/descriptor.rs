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

use crate::domain::backup_repo::builder::{
    config_to_strings, merge_values, BackupRepoBuilder, CredentialSecretBuilder,
};
use crate::domain::backup_repo::model::{BackupRepo, StorageProvider};
use crate::domain::schema::{CanonicalSchema, ValueMap};
use crate::infrastructure::constants::{
    ANNOTATION_DEFAULT_REPO, KIND_BACKUP_REPO, KIND_STORAGE_PROVIDER, LABEL_MANAGED_BY,
    LABEL_MANAGED_BY_VALUE,
};
use crate::infrastructure::kubernetes::client::{ControlPlaneClient, ControlPlaneClientImpl};
use crate::shared::error::CtlError;
use k8s_openapi::api::core::v1::Secret;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Everything `backup-repo create` sends to the cluster.
#[derive(Debug, Clone, Default)]
pub struct CreateRepoRequest {
    pub name: String,
    pub provider: String,
    pub access_method: String,
    pub pv_reclaim_policy: String,
    pub volume_capacity: Option<String>,
    pub config: ValueMap,
    pub credential: BTreeMap<String, String>,
    pub is_default: bool,
}

/// Changes requested by `backup-repo update`; empty fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct UpdateRepoRequest {
    pub config: ValueMap,
    pub credential: BTreeMap<String, String>,
    pub is_default: Option<bool>,
}

impl UpdateRepoRequest {
    pub fn is_empty(&self) -> bool {
        self.config.is_empty() && self.credential.is_empty() && self.is_default.is_none()
    }
}

pub struct BackupRepoDescriptor {
    client: Box<dyn ControlPlaneClient>,
}

impl BackupRepoDescriptor {
    pub fn new(client: Box<dyn ControlPlaneClient>) -> Self {
        Self { client }
    }

    pub async fn new_with_config(
        namespace: String,
        kubeconfig_path: Option<String>,
        context: Option<String>,
    ) -> Result<Self, CtlError> {
        let client =
            ControlPlaneClientImpl::new_with_config(namespace, kubeconfig_path, context).await?;
        Ok(Self::new(Box::new(client)))
    }

    /// Fetch a provider's parameter schema and normalize it.
    pub async fn fetch_provider_schema(&self, provider: &str) -> Result<CanonicalSchema, CtlError> {
        let obj = self
            .client
            .get_storage_provider(provider)
            .await
            .map_err(|e| match e {
                e @ CtlError::NotFound { .. } => e,
                e => CtlError::SchemaFetch(format!("{} '{}': {}", KIND_STORAGE_PROVIDER, provider, e)),
            })?;
        StorageProvider::from_dynamic(&obj).schema()
    }

    pub async fn create_repo(&self, request: CreateRepoRequest) -> Result<BackupRepo, CtlError> {
        match self.client.get_backup_repo(&request.name).await {
            Ok(_) => return Err(CtlError::already_exists(KIND_BACKUP_REPO, &request.name)),
            Err(CtlError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        if request.is_default {
            self.ensure_no_other_default(&request.name).await?;
        }

        let mut builder = BackupRepoBuilder::new(request.name.clone(), request.provider.clone())
            .access_method(&request.access_method)
            .pv_reclaim_policy(&request.pv_reclaim_policy)
            .volume_capacity(request.volume_capacity.clone())
            .config(config_to_strings(&request.config))
            .default_repo(request.is_default);

        let secret = if request.credential.is_empty() {
            None
        } else {
            let secret = CredentialSecretBuilder::new(
                request.name.clone(),
                self.client.namespace().to_string(),
                request.credential.clone(),
            )
            .build()?;
            let created = self.client.create_secret(&secret).await?;
            let name = created.metadata.name.unwrap_or_default();
            let namespace = created
                .metadata
                .namespace
                .unwrap_or_else(|| self.client.namespace().to_string());
            info!("created credential secret {}/{}", namespace, name);
            builder = builder.credential(name.clone(), namespace.clone());
            Some((namespace, name))
        };

        let repo = match builder.build() {
            Ok(obj) => self.client.create_backup_repo(&obj).await,
            Err(e) => Err(e),
        };

        match repo {
            Ok(obj) => {
                info!("created backup repo {}", request.name);
                Ok(BackupRepo::from_dynamic(&obj))
            }
            Err(e) => {
                if let Some((namespace, name)) = secret {
                    if let Err(cleanup) = self.client.delete_secret(&namespace, &name).await {
                        warn!(
                            "failed to roll back credential secret {}/{}: {}",
                            namespace, name, cleanup
                        );
                    }
                }
                Err(e)
            }
        }
    }

    /// Apply a partial change to an existing repository. Config keys are
    /// merged into the stored ones; credential keys are written into the
    /// repo's secret, creating it when the repo has none.
    pub async fn update_repo(
        &self,
        name: &str,
        request: UpdateRepoRequest,
    ) -> Result<BackupRepo, CtlError> {
        let current = BackupRepo::from_dynamic(&self.client.get_backup_repo(name).await?);
        if request.is_empty() {
            warn!("nothing to update for backup repo {}", name);
            return Ok(current);
        }
        if request.is_default == Some(true) && !current.is_default {
            self.ensure_no_other_default(name).await?;
        }

        let mut spec = Map::new();

        let undo = if request.credential.is_empty() {
            None
        } else {
            match &current.credential {
                Some(secret) => {
                    let previous = self
                        .client
                        .get_secret(&secret.namespace, &secret.name)
                        .await?;
                    let patch = json!({ "stringData": request.credential });
                    self.client
                        .patch_secret(&secret.namespace, &secret.name, &patch)
                        .await?;
                    info!(
                        "updated credential secret {}/{}",
                        secret.namespace, secret.name
                    );
                    Some(SecretUndo::Restore {
                        namespace: secret.namespace.clone(),
                        name: secret.name.clone(),
                        patch: restore_patch(&previous, request.credential.keys()),
                    })
                }
                None => {
                    let secret = CredentialSecretBuilder::new(
                        name.to_string(),
                        self.client.namespace().to_string(),
                        request.credential.clone(),
                    )
                    .build()?;
                    let created = self.client.create_secret(&secret).await?;
                    let secret_name = created.metadata.name.unwrap_or_default();
                    let namespace = created
                        .metadata
                        .namespace
                        .unwrap_or_else(|| self.client.namespace().to_string());
                    info!("created credential secret {}/{}", namespace, secret_name);
                    spec.insert(
                        "credential".to_string(),
                        json!({"name": secret_name, "namespace": namespace}),
                    );
                    Some(SecretUndo::Delete {
                        namespace,
                        name: secret_name,
                    })
                }
            }
        };

        if !request.config.is_empty() {
            let merged = merge_config(&current.config, request.config);
            spec.insert("config".to_string(), json!(config_to_strings(&merged)));
        }

        let mut patch = Map::new();
        if !spec.is_empty() {
            patch.insert("spec".to_string(), Value::Object(spec));
        }
        if let Some(is_default) = request.is_default {
            let annotation = if is_default {
                Value::String("true".to_string())
            } else {
                Value::Null
            };
            let mut annotations = Map::new();
            annotations.insert(ANNOTATION_DEFAULT_REPO.to_string(), annotation);
            patch.insert(
                "metadata".to_string(),
                json!({ "annotations": annotations }),
            );
        }

        if patch.is_empty() {
            return Ok(current);
        }
        let patch = Value::Object(patch);
        debug!("patching backup repo {}: {}", name, patch);
        match self.client.patch_backup_repo(name, &patch).await {
            Ok(updated) => {
                info!("updated backup repo {}", name);
                Ok(BackupRepo::from_dynamic(&updated))
            }
            Err(e) => {
                if let Some(undo) = undo {
                    self.undo_secret(undo).await;
                }
                Err(e)
            }
        }
    }

    async fn undo_secret(&self, undo: SecretUndo) {
        let (namespace, name, result) = match undo {
            SecretUndo::Delete { namespace, name } => {
                let result = self.client.delete_secret(&namespace, &name).await;
                (namespace, name, result)
            }
            SecretUndo::Restore {
                namespace,
                name,
                patch,
            } => {
                let result = self
                    .client
                    .patch_secret(&namespace, &name, &patch)
                    .await
                    .map(|_| ());
                (namespace, name, result)
            }
        };
        match result {
            Ok(()) => info!("rolled back credential secret {}/{}", namespace, name),
            Err(e) => warn!(
                "failed to roll back credential secret {}/{}: {}",
                namespace, name, e
            ),
        }
    }

    pub async fn list_repos(&self) -> Result<Vec<BackupRepo>, CtlError> {
        let mut repos: Vec<BackupRepo> = self
            .client
            .list_backup_repos()
            .await?
            .iter()
            .map(BackupRepo::from_dynamic)
            .collect();
        repos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(repos)
    }

    pub async fn get_repo(&self, name: &str) -> Result<BackupRepo, CtlError> {
        let obj = self.client.get_backup_repo(name).await?;
        Ok(BackupRepo::from_dynamic(&obj))
    }

    /// Key names stored in the repo's credential secret. Values are never read
    /// back out.
    pub async fn credential_keys(&self, repo: &BackupRepo) -> Result<Vec<String>, CtlError> {
        let Some(secret_ref) = &repo.credential else {
            return Ok(Vec::new());
        };
        let secret = self
            .client
            .get_secret(&secret_ref.namespace, &secret_ref.name)
            .await?;
        let mut keys: Vec<String> = secret
            .data
            .iter()
            .flat_map(|d| d.keys().cloned())
            .chain(secret.string_data.iter().flat_map(|d| d.keys().cloned()))
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    /// Delete a repository and the credential secret dbctl created for it.
    pub async fn delete_repo(&self, name: &str) -> Result<(), CtlError> {
        let repo = self.get_repo(name).await?;
        self.client.delete_backup_repo(name).await?;
        info!("deleted backup repo {}", name);

        if let Some(secret_ref) = &repo.credential {
            match self
                .client
                .get_secret(&secret_ref.namespace, &secret_ref.name)
                .await
            {
                Ok(secret) => {
                    let managed = secret
                        .metadata
                        .labels
                        .as_ref()
                        .and_then(|l| l.get(LABEL_MANAGED_BY))
                        .is_some_and(|v| v == LABEL_MANAGED_BY_VALUE);
                    if managed {
                        self.client
                            .delete_secret(&secret_ref.namespace, &secret_ref.name)
                            .await?;
                        info!(
                            "deleted credential secret {}/{}",
                            secret_ref.namespace, secret_ref.name
                        );
                    } else {
                        debug!(
                            "credential secret {}/{} is not managed by dbctl, keeping it",
                            secret_ref.namespace, secret_ref.name
                        );
                    }
                }
                Err(CtlError::NotFound { .. }) => {}
                Err(e) => warn!("failed to look up credential secret: {}", e),
            }
        }
        Ok(())
    }

    async fn ensure_no_other_default(&self, name: &str) -> Result<(), CtlError> {
        let others: Vec<String> = self
            .list_repos()
            .await?
            .into_iter()
            .filter(|r| r.is_default && r.name != name)
            .map(|r| r.name)
            .collect();
        if let Some(other) = others.first() {
            return Err(CtlError::config_error(format!(
                "backup repo '{}' is already the default, unset it first with \
                `dbctl backup-repo update {} --default=false`",
                other, other
            )));
        }
        Ok(())
    }
}

/// How to take back a credential write when the repo patch fails.
enum SecretUndo {
    Delete {
        namespace: String,
        name: String,
    },
    Restore {
        namespace: String,
        name: String,
        patch: Value,
    },
}

/// Merge patch putting `keys` back to their values in `previous`; keys the
/// secret did not hold are removed.
fn restore_patch<'k>(previous: &Secret, keys: impl Iterator<Item = &'k String>) -> Value {
    let data: Map<String, Value> = keys
        .map(|key| {
            let old = previous
                .data
                .as_ref()
                .and_then(|d| d.get(key))
                .and_then(|bytes| serde_json::to_value(bytes).ok())
                .unwrap_or(Value::Null);
            (key.clone(), old)
        })
        .collect();
    json!({ "data": data })
}

/// Merge partial config values into the stored string map. Stored values
/// that hold JSON objects are merged key by key.
fn merge_config(current: &BTreeMap<String, String>, changes: ValueMap) -> ValueMap {
    let mut merged: ValueMap = current
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    for (key, change) in changes {
        let existing = current
            .get(&key)
            .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
            .filter(Value::is_object);
        let value = match (existing, change) {
            (Some(mut base), change @ Value::Object(_)) => {
                merge_values(&mut base, change);
                base
            }
            (_, change) => change,
        };
        merged.insert(key, value);
    }
    merged
}
