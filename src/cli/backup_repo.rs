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

use super::{DynamicFlags, Session};
use crate::cli::display::{StatusIcon, TableRenderer};
use crate::domain::backup_repo::builder::random_suffix;
use crate::domain::backup_repo::{CreateRepoRequest, UpdateRepoRequest};
use crate::domain::params::{collect, validate, validate_partial, CollectMode};
use crate::infrastructure::constants::{
    ACCESS_METHOD_MOUNT, ACCESS_METHOD_TOOL, PV_RECLAIM_POLICY_DELETE, PV_RECLAIM_POLICY_RETAIN,
};
use clap::{ArgMatches, Parser};
use colored::Colorize;
use tracing::debug;

#[derive(Parser, Debug, Clone)]
pub struct CreateCommand {
    /// Repository name; `<provider>-<suffix>` when omitted
    pub name: Option<String>,

    /// Storage provider backing the repository
    #[arg(long)]
    pub provider: String,

    /// How backup tools reach the storage
    #[arg(long, value_parser = [ACCESS_METHOD_MOUNT, ACCESS_METHOD_TOOL])]
    pub access_method: Option<String>,

    /// What happens to the volume when the repository is deleted
    #[arg(long, value_parser = [PV_RECLAIM_POLICY_RETAIN, PV_RECLAIM_POLICY_DELETE])]
    pub pv_reclaim_policy: Option<String>,

    /// Volume capacity for the Mount access method (e.g., "100Gi")
    #[arg(long)]
    pub volume_capacity: Option<String>,

    /// Make this the default backup repository
    #[arg(long)]
    pub default: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct UpdateCommand {
    /// Repository to update; must precede the provider flags
    pub name: String,

    /// Set or clear the default-repository mark
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub default: Option<bool>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {}

#[derive(Parser, Debug, Clone)]
pub struct DescribeCommand {
    pub name: String,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    pub name: String,
}

impl CreateCommand {
    pub async fn execute(
        &self,
        session: &mut Session,
        dynamic: &DynamicFlags,
        matches: &ArgMatches,
    ) -> anyhow::Result<()> {
        let schema = dynamic.primary();
        let params = collect(matches, &schema, &dynamic.registry, CollectMode::Create)?;
        validate(&schema, &params.values)?.into_result()?;
        debug!("collected parameters: {:?}", params.values);

        let name = self
            .name
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.provider, random_suffix()));
        let defaults = session.conf.backup_repo.clone();
        let request = CreateRepoRequest {
            name: name.clone(),
            provider: self.provider.clone(),
            access_method: self
                .access_method
                .clone()
                .unwrap_or(defaults.access_method),
            pv_reclaim_policy: self
                .pv_reclaim_policy
                .clone()
                .unwrap_or(defaults.pv_reclaim_policy),
            volume_capacity: self.volume_capacity.clone(),
            config: params.config,
            credential: params.credential,
            is_default: self.default,
        };

        let repo = session
            .descriptor()
            .await?
            .create_repo(request)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create backup repo {}: {}", name, e))?;

        println!(
            "{} Backup repo {} created (provider: {})",
            StatusIcon::SUCCESS.green(),
            repo.name.bold(),
            repo.provider
        );
        Ok(())
    }
}

impl UpdateCommand {
    pub async fn execute(
        &self,
        session: &mut Session,
        dynamic: &DynamicFlags,
        matches: &ArgMatches,
    ) -> anyhow::Result<()> {
        let schema = dynamic.primary();
        let params = collect(matches, &schema, &dynamic.registry, CollectMode::Update)?;
        validate_partial(&schema, &params.values)?.into_result()?;

        let request = UpdateRepoRequest {
            config: params.config,
            credential: params.credential,
            is_default: self.default,
        };
        if request.is_empty() {
            println!("Nothing to update for backup repo {}", self.name);
            return Ok(());
        }

        session
            .descriptor()
            .await?
            .update_repo(&self.name, request)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to update backup repo {}: {}", self.name, e))?;

        println!(
            "{} Backup repo {} updated",
            StatusIcon::SUCCESS.green(),
            self.name.bold()
        );
        Ok(())
    }
}

impl ListCommand {
    pub async fn execute(&self, session: &mut Session) -> anyhow::Result<()> {
        let repos = session
            .descriptor()
            .await?
            .list_repos()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to list backup repos: {}", e))?;

        let renderer = TableRenderer::new();
        println!("{}", renderer.render_repos_list(&repos));
        Ok(())
    }
}

impl DescribeCommand {
    pub async fn execute(&self, session: &mut Session) -> anyhow::Result<()> {
        let descriptor = session.descriptor().await?;
        let repo = descriptor
            .get_repo(&self.name)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get backup repo: {}", e))?;
        let keys = match descriptor.credential_keys(&repo).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!("cannot read credential secret: {}", e);
                Vec::new()
            }
        };

        let renderer = TableRenderer::new();
        println!("{}", renderer.render_repo_detail(&repo, &keys));
        Ok(())
    }
}

impl DeleteCommand {
    pub async fn execute(&self, session: &mut Session) -> anyhow::Result<()> {
        session
            .descriptor()
            .await?
            .delete_repo(&self.name)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to delete backup repo: {}", e))?;

        println!("Backup repo {} deleted successfully!", self.name);
        Ok(())
    }
}
