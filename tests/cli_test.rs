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

use async_trait::async_trait;
use clap::error::ErrorKind;
use dbctl::cli::{build_command, run_with, DynamicTarget, Prescan, Session};
use dbctl::domain::params::FlagRegistry;
use dbctl::domain::schema::normalize;
use dbctl::infrastructure::kubernetes::{backup_repo_resource, storage_provider_resource};
use dbctl::{BackupRepoDescriptor, ControlPlaneClient, CtlConf, CtlError};
use k8s_openapi::api::core::v1::Secret;
use kube::api::DynamicObject;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct State {
    providers: BTreeMap<String, DynamicObject>,
    repos: BTreeMap<String, DynamicObject>,
    secrets: BTreeMap<String, Secret>,
    repo_patches: Vec<Value>,
}

#[derive(Clone, Default)]
struct FakeClient {
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl ControlPlaneClient for FakeClient {
    fn namespace(&self) -> &str {
        "kb-system"
    }

    async fn get_storage_provider(&self, name: &str) -> Result<DynamicObject, CtlError> {
        let state = self.state.lock().unwrap();
        state
            .providers
            .get(name)
            .cloned()
            .ok_or_else(|| CtlError::not_found("StorageProvider", name))
    }

    async fn get_backup_repo(&self, name: &str) -> Result<DynamicObject, CtlError> {
        let state = self.state.lock().unwrap();
        state
            .repos
            .get(name)
            .cloned()
            .ok_or_else(|| CtlError::not_found("BackupRepo", name))
    }

    async fn list_backup_repos(&self) -> Result<Vec<DynamicObject>, CtlError> {
        Ok(self.state.lock().unwrap().repos.values().cloned().collect())
    }

    async fn create_backup_repo(&self, repo: &DynamicObject) -> Result<DynamicObject, CtlError> {
        let mut state = self.state.lock().unwrap();
        let name = repo.metadata.name.clone().unwrap_or_default();
        state.repos.insert(name, repo.clone());
        Ok(repo.clone())
    }

    async fn patch_backup_repo(&self, name: &str, patch: &Value) -> Result<DynamicObject, CtlError> {
        let mut state = self.state.lock().unwrap();
        state.repo_patches.push(patch.clone());
        state
            .repos
            .get(name)
            .cloned()
            .ok_or_else(|| CtlError::not_found("BackupRepo", name))
    }

    async fn delete_backup_repo(&self, name: &str) -> Result<(), CtlError> {
        let mut state = self.state.lock().unwrap();
        state
            .repos
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| CtlError::not_found("BackupRepo", name))
    }

    async fn create_secret(&self, secret: &Secret) -> Result<Secret, CtlError> {
        let mut state = self.state.lock().unwrap();
        let name = secret.metadata.name.clone().unwrap_or_default();
        state.secrets.insert(name, secret.clone());
        Ok(secret.clone())
    }

    async fn get_secret(&self, _namespace: &str, name: &str) -> Result<Secret, CtlError> {
        let state = self.state.lock().unwrap();
        state
            .secrets
            .get(name)
            .cloned()
            .ok_or_else(|| CtlError::not_found("Secret", name))
    }

    async fn patch_secret(
        &self,
        namespace: &str,
        name: &str,
        _patch: &Value,
    ) -> Result<Secret, CtlError> {
        self.get_secret(namespace, name).await
    }

    async fn delete_secret(&self, _namespace: &str, name: &str) -> Result<(), CtlError> {
        let mut state = self.state.lock().unwrap();
        state
            .secrets
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| CtlError::not_found("Secret", name))
    }
}

mod test_utils {
    use super::*;

    pub fn s3_provider() -> DynamicObject {
        DynamicObject::new("s3", &storage_provider_resource()).data(json!({"spec": {
            "parametersSchema": {
                "openAPIV3Schema": {
                    "type": "object",
                    "properties": {
                        "bucket": {"type": "string"},
                        "region": {"type": "string", "default": "us-east-1"},
                        "namespace": {"type": "string"},
                        "accessKeyId": {"type": "string"},
                        "secretAccessKey": {"type": "string"}
                    },
                    "required": ["bucket"]
                },
                "credentialFields": ["accessKeyId", "secretAccessKey"]
            }
        }}))
    }

    pub fn fake() -> FakeClient {
        let fake = FakeClient::default();
        fake.state
            .lock()
            .unwrap()
            .providers
            .insert("s3".to_string(), s3_provider());
        fake
    }

    pub fn session(fake: &FakeClient) -> Session {
        Session::with_descriptor(
            CtlConf::default(),
            BackupRepoDescriptor::new(Box::new(fake.clone())),
        )
    }

    pub fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("dbctl")
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect()
    }

    pub async fn run(fake: &FakeClient, args: &[&str]) -> anyhow::Result<()> {
        let argv = argv(args);
        let scan = Prescan::scan(&argv);
        run_with(argv, scan, session(fake)).await
    }

    pub fn schema_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }
}

use test_utils::*;

#[tokio::test]
async fn test_create_routes_credentials_into_secret() {
    let fake = fake();
    run(
        &fake,
        &[
            "backup-repo",
            "create",
            "my-repo",
            "--provider",
            "s3",
            "--bucket",
            "backups",
            "--access-key-id",
            "AK",
            "--secret-access-key=secret123",
        ],
    )
    .await
    .unwrap();

    let state = fake.state.lock().unwrap();
    let repo = state.repos.get("my-repo").expect("repo should be created");
    let spec = &repo.data["spec"];
    assert_eq!(spec["storageProviderRef"], "s3");
    assert_eq!(spec["config"]["bucket"], "backups");
    assert_eq!(spec["config"]["region"], "us-east-1");
    assert!(spec["config"].get("accessKeyId").is_none());
    assert!(!spec["config"].to_string().contains("secret123"));

    assert_eq!(state.secrets.len(), 1);
    let secret = state.secrets.values().next().unwrap();
    let data = secret.string_data.as_ref().unwrap();
    assert_eq!(data.get("secretAccessKey").unwrap(), "secret123");
    assert_eq!(data.get("accessKeyId").unwrap(), "AK");
    assert_eq!(spec["credential"]["name"], secret.metadata.name.clone().unwrap());
}

#[tokio::test]
async fn test_missing_required_flag_fails_before_any_write() {
    let fake = fake();
    let err = run(&fake, &["backup-repo", "create", "my-repo", "--provider", "s3"])
        .await
        .unwrap_err();

    let clap_err = err.downcast_ref::<clap::Error>().expect("clap error");
    assert_eq!(clap_err.kind(), ErrorKind::MissingRequiredArgument);

    let state = fake.state.lock().unwrap();
    assert!(state.repos.is_empty());
    assert!(state.secrets.is_empty());
}

#[tokio::test]
async fn test_unknown_provider_is_reported() {
    let fake = fake();
    let err = run(&fake, &["backup-repo", "create", "--provider", "gcs", "--bucket", "b"])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("gcs"));
    assert!(fake.state.lock().unwrap().repos.is_empty());
}

#[tokio::test]
async fn test_update_sends_only_typed_values() {
    let fake = fake();
    let existing = DynamicObject::new("my-repo", &backup_repo_resource()).data(json!({"spec": {
        "storageProviderRef": "s3",
        "config": {"bucket": "a", "region": "eu-west-1"}
    }}));
    fake.state
        .lock()
        .unwrap()
        .repos
        .insert("my-repo".to_string(), existing);

    // `bucket` is required by the schema but not needed for an update
    run(&fake, &["backup-repo", "update", "my-repo", "--region=ap-south-1"])
        .await
        .unwrap();

    let state = fake.state.lock().unwrap();
    assert_eq!(state.repo_patches.len(), 1);
    assert_eq!(
        state.repo_patches[0],
        json!({"spec": {"config": {"bucket": "a", "region": "ap-south-1"}}})
    );
    assert!(state.secrets.is_empty());
}

#[tokio::test]
async fn test_update_without_flags_writes_nothing() {
    let fake = fake();
    let existing = DynamicObject::new("my-repo", &backup_repo_resource())
        .data(json!({"spec": {"storageProviderRef": "s3", "config": {"bucket": "a"}}}));
    fake.state
        .lock()
        .unwrap()
        .repos
        .insert("my-repo".to_string(), existing);

    run(&fake, &["backup-repo", "update", "my-repo"]).await.unwrap();
    assert!(fake.state.lock().unwrap().repo_patches.is_empty());
}

#[test]
fn test_schema_property_cannot_shadow_global_flag() {
    let schema = normalize(&s3_provider().data["spec"]["parametersSchema"]).unwrap();
    let mut registry = FlagRegistry::new();
    let cmd = build_command(
        &["backup-repo".to_string(), "create".to_string()],
        &[schema],
        &mut registry,
    )
    .unwrap();
    cmd.clone().debug_assert();

    assert!(!registry.contains("namespace"));
    assert!(registry.contains("bucket"));
    assert!(registry.contains("access-key-id"));

    let matches = cmd
        .try_get_matches_from(argv(&[
            "backup-repo",
            "create",
            "--provider",
            "s3",
            "-n",
            "backup",
            "--bucket",
            "b",
        ]))
        .unwrap();
    assert_eq!(
        matches.get_one::<String>("namespace").map(String::as_str),
        Some("backup")
    );
}

#[test]
fn test_prescan_finds_schema_files() {
    let scan = Prescan::scan(&argv(&["schema", "flags", "-f", "a.yaml", "--file=b.yaml"]));
    assert_eq!(
        scan.target,
        Some(DynamicTarget::Files(vec!["a.yaml".into(), "b.yaml".into()]))
    );
}

#[tokio::test]
async fn test_schema_validate_reports_enum_violation() {
    let fake = FakeClient::default();
    let file = schema_file(
        r#"
type: object
properties:
  mode:
    type: string
    enum: [Serial, Parallel]
"#,
    );
    let path = file.path().to_str().unwrap();

    run(&fake, &["schema", "validate", "-f", path, "--mode=Parallel"])
        .await
        .unwrap();

    let err = run(&fake, &["schema", "validate", "-f", path, "--mode=Bogus"])
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("\n--mode: "), "unexpected message: {}", message);
}

#[tokio::test]
async fn test_schema_validate_merges_values_file() {
    let fake = FakeClient::default();
    let schema = schema_file(
        r#"
type: object
properties:
  bucket:
    type: string
  replicas:
    type: integer
    minimum: 1
required: [bucket]
"#,
    );
    let values = schema_file("bucket: backups\nreplicas: 3\n");
    let schema_path = schema.path().to_str().unwrap();
    let values_path = values.path().to_str().unwrap();

    run(
        &fake,
        &["schema", "validate", "-f", schema_path, "--values", values_path],
    )
    .await
    .unwrap();

    let err = run(
        &fake,
        &[
            "schema",
            "validate",
            "-f",
            schema_path,
            "--values",
            values_path,
            "--replicas=0",
        ],
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("--replicas"));
}

#[tokio::test]
async fn test_nested_array_schema_is_rejected_before_parsing() {
    let fake = FakeClient::default();
    let file = schema_file(
        r#"
type: object
properties:
  matrix:
    type: array
    items:
      type: array
      items:
        type: string
"#,
    );
    let err = run(
        &fake,
        &["schema", "flags", "-f", file.path().to_str().unwrap()],
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CtlError>(),
        Some(CtlError::UnsupportedSchema { .. })
    ));
}
