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

//! BackupRepo management on top of the schema-driven parameter engine.

pub mod builder;
pub mod descriptor;
pub mod model;

pub use self::builder::{validate_name, BackupRepoBuilder, CredentialSecretBuilder};
pub use self::descriptor::{BackupRepoDescriptor, CreateRepoRequest, UpdateRepoRequest};
pub use self::model::{BackupRepo, SecretRef, StorageProvider};
