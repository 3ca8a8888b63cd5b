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

/// Data-protection API group
pub const DP_GROUP: &str = "dataprotection.kubeblocks.io";
pub const DP_VERSION: &str = "v1alpha1";
pub const KIND_STORAGE_PROVIDER: &str = "StorageProvider";
pub const PLURAL_STORAGE_PROVIDER: &str = "storageproviders";
pub const KIND_BACKUP_REPO: &str = "BackupRepo";
pub const PLURAL_BACKUP_REPO: &str = "backuprepos";

/// Annotations
pub const ANNOTATION_DEFAULT_REPO: &str = "dataprotection.kubeblocks.io/is-default-repo";

/// Resource labels
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";
pub const LABEL_MANAGED_BY_VALUE: &str = "dbctl";
pub const LABEL_BACKUP_REPO_NAME: &str = "dataprotection.kubeblocks.io/backup-repo-name";

/// Server-side field manager for patches
pub const FIELD_MANAGER: &str = "dbctl";

/// Secret naming
pub const CREDENTIAL_SECRET_SUFFIX: &str = "-credential-";

/// Access methods
pub const ACCESS_METHOD_MOUNT: &str = "Mount";
pub const ACCESS_METHOD_TOOL: &str = "Tool";

/// PV reclaim policies
pub const PV_RECLAIM_POLICY_RETAIN: &str = "Retain";
pub const PV_RECLAIM_POLICY_DELETE: &str = "Delete";

/// Defaults
pub const DEFAULT_NAMESPACE: &str = "kb-system";
pub const DEFAULT_ACCESS_METHOD: &str = ACCESS_METHOD_TOOL;
pub const DEFAULT_PV_RECLAIM_POLICY: &str = PV_RECLAIM_POLICY_RETAIN;
pub const DEFAULT_VOLUME_CAPACITY: &str = "";

/// Configuration file lookup
pub const CONFIG_ENV: &str = "DBCTL_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = ".dbctl/config.toml";

/// Random suffix length for generated names
pub const NAME_SUFFIX_LEN: usize = 5;
