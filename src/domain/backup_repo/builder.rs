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

use crate::domain::params::stringify_value;
use crate::domain::schema::ValueMap;
use crate::infrastructure::constants::{
    ANNOTATION_DEFAULT_REPO, CREDENTIAL_SECRET_SUFFIX, LABEL_BACKUP_REPO_NAME, LABEL_MANAGED_BY,
    LABEL_MANAGED_BY_VALUE, NAME_SUFFIX_LEN,
};
use crate::infrastructure::kubernetes::backup_repo_resource;
use crate::shared::error::CtlError;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::DynamicObject;
use rand::distr::Alphanumeric;
use rand::Rng;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::BTreeMap;

const DNS1123_SUBDOMAIN: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$";
const DNS1123_SUBDOMAIN_MAX_LEN: usize = 253;

/// Check that `name` is usable as a Kubernetes object name.
pub fn validate_name(name: &str) -> Result<(), CtlError> {
    let re = Regex::new(DNS1123_SUBDOMAIN)
        .map_err(|e| CtlError::config_error(format!("invalid name pattern: {}", e)))?;
    if name.len() > DNS1123_SUBDOMAIN_MAX_LEN || !re.is_match(name) {
        return Err(CtlError::config_error(format!(
            "invalid name '{}': must consist of lower case alphanumeric characters, '-' or '.', \
            and must start and end with an alphanumeric character",
            name
        )));
    }
    Ok(())
}

/// Random lower-case suffix for generated object names.
pub fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(NAME_SUFFIX_LEN)
        .map(|b: u8| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Flatten collected config into the string map BackupRepo carries.
pub fn config_to_strings(config: &ValueMap) -> BTreeMap<String, String> {
    config
        .iter()
        .map(|(k, v)| (k.clone(), stringify_value(v)))
        .collect()
}

fn owner_labels(repo_name: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(
        LABEL_MANAGED_BY.to_string(),
        LABEL_MANAGED_BY_VALUE.to_string(),
    );
    labels.insert(LABEL_BACKUP_REPO_NAME.to_string(), repo_name.to_string());
    labels
}

pub struct CredentialSecretBuilder {
    repo_name: String,
    namespace: String,
    credential: BTreeMap<String, String>,
    suffix: String,
}

impl CredentialSecretBuilder {
    pub fn new(repo_name: String, namespace: String, credential: BTreeMap<String, String>) -> Self {
        Self {
            repo_name,
            namespace,
            credential,
            suffix: random_suffix(),
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn secret_name(&self) -> String {
        format!("{}{}{}", self.repo_name, CREDENTIAL_SECRET_SUFFIX, self.suffix)
    }

    pub fn build(&self) -> Result<Secret, CtlError> {
        let name = self.secret_name();
        validate_name(&name)?;

        Ok(Secret {
            metadata: ObjectMeta {
                name: Some(name),
                namespace: Some(self.namespace.clone()),
                labels: Some(owner_labels(&self.repo_name)),
                ..Default::default()
            },
            string_data: Some(self.credential.clone()),
            type_: Some("Opaque".to_string()),
            ..Default::default()
        })
    }
}

pub struct BackupRepoBuilder {
    name: String,
    provider: String,
    access_method: String,
    pv_reclaim_policy: String,
    volume_capacity: Option<String>,
    config: BTreeMap<String, String>,
    credential: Option<(String, String)>,
    is_default: bool,
}

impl BackupRepoBuilder {
    pub fn new(name: String, provider: String) -> Self {
        Self {
            name,
            provider,
            access_method: String::new(),
            pv_reclaim_policy: String::new(),
            volume_capacity: None,
            config: BTreeMap::new(),
            credential: None,
            is_default: false,
        }
    }

    pub fn access_method(mut self, method: impl Into<String>) -> Self {
        self.access_method = method.into();
        self
    }

    pub fn pv_reclaim_policy(mut self, policy: impl Into<String>) -> Self {
        self.pv_reclaim_policy = policy.into();
        self
    }

    pub fn volume_capacity(mut self, capacity: Option<String>) -> Self {
        self.volume_capacity = capacity.filter(|c| !c.is_empty());
        self
    }

    pub fn config(mut self, config: BTreeMap<String, String>) -> Self {
        self.config = config;
        self
    }

    pub fn credential(mut self, secret_name: String, namespace: String) -> Self {
        self.credential = Some((secret_name, namespace));
        self
    }

    pub fn default_repo(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    pub fn build(&self) -> Result<DynamicObject, CtlError> {
        validate_name(&self.name)?;

        let mut spec = json!({
            "storageProviderRef": self.provider,
            "accessMethod": self.access_method,
            "pvReclaimPolicy": self.pv_reclaim_policy,
            "config": self.config,
        });
        if let Some(capacity) = &self.volume_capacity {
            spec["volumeCapacity"] = Value::String(capacity.clone());
        }
        if let Some((name, namespace)) = &self.credential {
            spec["credential"] = json!({"name": name, "namespace": namespace});
        }

        let mut repo = DynamicObject::new(&self.name, &backup_repo_resource())
            .data(json!({ "spec": spec }));
        if self.is_default {
            let mut annotations = BTreeMap::new();
            annotations.insert(ANNOTATION_DEFAULT_REPO.to_string(), "true".to_string());
            repo.metadata.annotations = Some(annotations);
        }
        Ok(repo)
    }
}

/// Deep-merge `patch` into `base`. Objects merge key by key, anything else
/// replaces.
pub fn merge_values(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                merge_values(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, patch) => *base = patch,
    }
}
