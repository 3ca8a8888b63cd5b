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

use crate::infrastructure::constants::{
    DP_GROUP, DP_VERSION, FIELD_MANAGER, KIND_BACKUP_REPO, KIND_STORAGE_PROVIDER,
    PLURAL_BACKUP_REPO, PLURAL_STORAGE_PROVIDER,
};
use crate::shared::error::CtlError;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{
    ApiResource, DeleteParams, DynamicObject, GroupVersionKind, ListParams, Patch, PatchParams,
    PostParams,
};
use kube::{Api, Client};
use serde_json::Value;

/// Control-plane operations dbctl needs. Kept behind a trait so the domain
/// layer can be exercised without a cluster.
#[async_trait::async_trait]
pub trait ControlPlaneClient: Send + Sync {
    /// Namespace credential secrets are written to.
    fn namespace(&self) -> &str;

    async fn get_storage_provider(&self, name: &str) -> Result<DynamicObject, CtlError>;

    async fn get_backup_repo(&self, name: &str) -> Result<DynamicObject, CtlError>;

    async fn list_backup_repos(&self) -> Result<Vec<DynamicObject>, CtlError>;

    async fn create_backup_repo(&self, repo: &DynamicObject) -> Result<DynamicObject, CtlError>;

    async fn patch_backup_repo(&self, name: &str, patch: &Value)
        -> Result<DynamicObject, CtlError>;

    async fn delete_backup_repo(&self, name: &str) -> Result<(), CtlError>;

    async fn create_secret(&self, secret: &Secret) -> Result<Secret, CtlError>;

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, CtlError>;

    async fn patch_secret(&self, namespace: &str, name: &str, patch: &Value)
        -> Result<Secret, CtlError>;

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<(), CtlError>;
}

pub fn storage_provider_resource() -> ApiResource {
    ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk(DP_GROUP, DP_VERSION, KIND_STORAGE_PROVIDER),
        PLURAL_STORAGE_PROVIDER,
    )
}

pub fn backup_repo_resource() -> ApiResource {
    ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk(DP_GROUP, DP_VERSION, KIND_BACKUP_REPO),
        PLURAL_BACKUP_REPO,
    )
}

pub struct ControlPlaneClientImpl {
    client: Client,
    namespace: String,
}

impl ControlPlaneClientImpl {
    pub async fn new(namespace: String) -> Result<Self, CtlError> {
        let client = Client::try_default().await.map_err(|e| {
            CtlError::KubeError(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self { client, namespace })
    }

    pub async fn new_with_config(
        namespace: String,
        kubeconfig_path: Option<String>,
        context: Option<String>,
    ) -> Result<Self, CtlError> {
        use kube::config::{KubeConfigOptions, Kubeconfig};

        if kubeconfig_path.is_none() && context.is_none() {
            return Self::new(namespace).await;
        }

        let kubeconfig = if let Some(path) = kubeconfig_path {
            Kubeconfig::read_from(path)
                .map_err(|e| CtlError::KubeError(format!("Failed to load kubeconfig: {}", e)))?
        } else {
            Kubeconfig::read()
                .map_err(|e| CtlError::KubeError(format!("Failed to load kubeconfig: {}", e)))?
        };

        let config_options = KubeConfigOptions {
            context,
            cluster: None,
            user: None,
        };

        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &config_options)
            .await
            .map_err(|e| {
                CtlError::KubeError(format!("Failed to create Kubernetes config: {}", e))
            })?;

        let client = Client::try_from(config).map_err(|e| {
            CtlError::KubeError(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self { client, namespace })
    }

    fn providers(&self) -> Api<DynamicObject> {
        Api::all_with(self.client.clone(), &storage_provider_resource())
    }

    fn repos(&self) -> Api<DynamicObject> {
        Api::all_with(self.client.clone(), &backup_repo_resource())
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn patch_params() -> PatchParams {
        PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..PatchParams::default()
        }
    }
}

#[async_trait::async_trait]
impl ControlPlaneClient for ControlPlaneClientImpl {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get_storage_provider(&self, name: &str) -> Result<DynamicObject, CtlError> {
        self.providers()
            .get(name)
            .await
            .map_err(|e| CtlError::from_api(e, KIND_STORAGE_PROVIDER, name))
    }

    async fn get_backup_repo(&self, name: &str) -> Result<DynamicObject, CtlError> {
        self.repos()
            .get(name)
            .await
            .map_err(|e| CtlError::from_api(e, KIND_BACKUP_REPO, name))
    }

    async fn list_backup_repos(&self) -> Result<Vec<DynamicObject>, CtlError> {
        let list = self.repos().list(&ListParams::default()).await?;
        Ok(list.items)
    }

    async fn create_backup_repo(&self, repo: &DynamicObject) -> Result<DynamicObject, CtlError> {
        let name = repo.metadata.name.clone().unwrap_or_default();
        self.repos()
            .create(&PostParams::default(), repo)
            .await
            .map_err(|e| CtlError::from_api(e, KIND_BACKUP_REPO, &name))
    }

    async fn patch_backup_repo(
        &self,
        name: &str,
        patch: &Value,
    ) -> Result<DynamicObject, CtlError> {
        self.repos()
            .patch(name, &Self::patch_params(), &Patch::Merge(patch))
            .await
            .map_err(|e| CtlError::from_api(e, KIND_BACKUP_REPO, name))
    }

    async fn delete_backup_repo(&self, name: &str) -> Result<(), CtlError> {
        self.repos()
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| CtlError::from_api(e, KIND_BACKUP_REPO, name))?;
        Ok(())
    }

    async fn create_secret(&self, secret: &Secret) -> Result<Secret, CtlError> {
        let namespace = secret
            .metadata
            .namespace
            .clone()
            .unwrap_or_else(|| self.namespace.clone());
        let name = secret.metadata.name.clone().unwrap_or_default();
        self.secrets(&namespace)
            .create(&PostParams::default(), secret)
            .await
            .map_err(|e| CtlError::from_api(e, "Secret", &name))
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, CtlError> {
        self.secrets(namespace)
            .get(name)
            .await
            .map_err(|e| CtlError::from_api(e, "Secret", name))
    }

    async fn patch_secret(
        &self,
        namespace: &str,
        name: &str,
        patch: &Value,
    ) -> Result<Secret, CtlError> {
        self.secrets(namespace)
            .patch(name, &Self::patch_params(), &Patch::Merge(patch))
            .await
            .map_err(|e| CtlError::from_api(e, "Secret", name))
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<(), CtlError> {
        self.secrets(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| CtlError::from_api(e, "Secret", name))?;
        Ok(())
    }
}
