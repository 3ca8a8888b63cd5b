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

use crate::domain::schema::{self, CanonicalSchema};
use crate::infrastructure::constants::ANNOTATION_DEFAULT_REPO;
use crate::shared::error::CtlError;
use chrono::{DateTime, Utc};
use kube::api::DynamicObject;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// A storage backend registered with the control plane.
#[derive(Debug, Clone)]
pub struct StorageProvider {
    pub name: String,
    /// Raw `spec.parametersSchema`, absent for providers that take no parameters.
    pub parameters_schema: Option<Value>,
}

impl StorageProvider {
    pub fn from_dynamic(obj: &DynamicObject) -> Self {
        let parameters_schema = obj
            .data
            .pointer("/spec/parametersSchema")
            .filter(|v| !v.is_null())
            .cloned();
        Self {
            name: obj.metadata.name.clone().unwrap_or_default(),
            parameters_schema,
        }
    }

    pub fn schema(&self) -> Result<CanonicalSchema, CtlError> {
        match &self.parameters_schema {
            Some(raw) => schema::normalize(raw),
            None => {
                warn!(
                    "storage provider {} declares no parameters schema",
                    self.name
                );
                Ok(CanonicalSchema::new(BTreeMap::new(), Vec::new()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    pub name: String,
    pub namespace: String,
}

/// Read-side view of a BackupRepo object.
#[derive(Debug, Clone)]
pub struct BackupRepo {
    pub name: String,
    pub provider: String,
    pub access_method: String,
    pub pv_reclaim_policy: String,
    pub volume_capacity: Option<String>,
    pub config: BTreeMap<String, String>,
    pub credential: Option<SecretRef>,
    pub phase: String,
    pub is_default: bool,
    pub created: Option<DateTime<Utc>>,
}

impl BackupRepo {
    pub fn from_dynamic(obj: &DynamicObject) -> Self {
        let spec = obj.data.get("spec").cloned().unwrap_or(Value::Null);
        let text = |key: &str| spec.get(key).and_then(Value::as_str).map(str::to_string);

        let config = spec
            .get("config")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(k, v)| {
                        let v = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                        (k.clone(), v)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let credential = spec.get("credential").and_then(|c| {
            Some(SecretRef {
                name: c.get("name")?.as_str()?.to_string(),
                namespace: c
                    .get("namespace")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
        });

        let is_default = obj
            .metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(ANNOTATION_DEFAULT_REPO))
            .is_some_and(|v| v == "true");

        Self {
            name: obj.metadata.name.clone().unwrap_or_default(),
            provider: text("storageProviderRef").unwrap_or_default(),
            access_method: text("accessMethod").unwrap_or_default(),
            pv_reclaim_policy: text("pvReclaimPolicy").unwrap_or_default(),
            volume_capacity: text("volumeCapacity"),
            config,
            credential,
            phase: obj
                .data
                .pointer("/status/phase")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string(),
            is_default,
            created: obj.metadata.creation_timestamp.as_ref().map(|t| t.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::kubernetes::backup_repo_resource;
    use serde_json::json;

    #[test]
    fn test_backup_repo_from_dynamic() {
        let mut obj = DynamicObject::new("s3-repo", &backup_repo_resource()).data(json!({
            "spec": {
                "storageProviderRef": "s3",
                "accessMethod": "Tool",
                "pvReclaimPolicy": "Retain",
                "config": {"bucket": "backups", "region": "us-east-1"},
                "credential": {"name": "s3-repo-credential-abcde", "namespace": "kb-system"}
            },
            "status": {"phase": "Ready"}
        }));
        obj.metadata.annotations = Some(
            [(ANNOTATION_DEFAULT_REPO.to_string(), "true".to_string())]
                .into_iter()
                .collect(),
        );

        let repo = BackupRepo::from_dynamic(&obj);
        assert_eq!(repo.name, "s3-repo");
        assert_eq!(repo.provider, "s3");
        assert_eq!(repo.config.get("bucket").unwrap(), "backups");
        assert_eq!(repo.phase, "Ready");
        assert!(repo.is_default);
        assert_eq!(repo.volume_capacity, None);
        assert_eq!(
            repo.credential,
            Some(SecretRef {
                name: "s3-repo-credential-abcde".to_string(),
                namespace: "kb-system".to_string(),
            })
        );
    }

    #[test]
    fn test_provider_without_schema() {
        let obj = DynamicObject::new("pvc", &crate::infrastructure::kubernetes::storage_provider_resource())
            .data(json!({"spec": {}}));
        let provider = StorageProvider::from_dynamic(&obj);
        assert!(provider.parameters_schema.is_none());
        assert!(provider.schema().unwrap().properties().is_empty());
    }

    #[test]
    fn test_provider_schema_is_normalized() {
        let obj = DynamicObject::new("s3", &crate::infrastructure::kubernetes::storage_provider_resource())
            .data(json!({"spec": {"parametersSchema": {
                "openAPIV3Schema": {
                    "type": "object",
                    "properties": {
                        "bucket": {"type": "string"},
                        "accessKeyId": {"type": "string"}
                    },
                    "required": ["bucket"]
                },
                "credentialFields": ["accessKeyId"]
            }}}));
        let schema = StorageProvider::from_dynamic(&obj).schema().unwrap();
        assert_eq!(schema.required(), ["bucket".to_string()]);
        assert!(schema.is_credential("accessKeyId"));
    }
}
