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

//! Command-line surface.
//!
//! Parsing happens in two phases: argv is prescanned to find which schema the
//! invoked command needs, that schema's flags are synthesized onto the static
//! clap tree, and only then is argv parsed strictly.

pub mod backup_repo;
pub mod commands;
pub mod display;
pub mod prescan;
pub mod schema;

pub use commands::{BackupRepoCommands, CliArgs, Commands, GlobalArgs, SchemaCommands};
pub use prescan::{DynamicTarget, Prescan};

use crate::domain::backup_repo::BackupRepoDescriptor;
use crate::domain::config::CtlConf;
use crate::domain::params::{FlagRegistry, Synthesizer};
use crate::domain::schema::{self as param_schema, CanonicalSchema};
use crate::shared::error::CtlError;
use anyhow::Context;
use clap::{ArgMatches, Command, CommandFactory, FromArgMatches};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Per-invocation state: resolved configuration and a lazily created
/// control-plane connection.
pub struct Session {
    pub conf: CtlConf,
    descriptor: Option<BackupRepoDescriptor>,
}

impl Session {
    pub fn new(conf: CtlConf) -> Self {
        Self {
            conf,
            descriptor: None,
        }
    }

    /// A session bound to an existing descriptor, e.g. one backed by a
    /// different client implementation.
    pub fn with_descriptor(conf: CtlConf, descriptor: BackupRepoDescriptor) -> Self {
        Self {
            conf,
            descriptor: Some(descriptor),
        }
    }

    pub async fn descriptor(&mut self) -> anyhow::Result<&BackupRepoDescriptor> {
        if self.descriptor.is_none() {
            let kube = &self.conf.kubernetes;
            let descriptor = BackupRepoDescriptor::new_with_config(
                kube.namespace.clone(),
                kube.kubeconfig.clone(),
                kube.context.clone(),
            )
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to the control plane: {}", e))?;
            self.descriptor = Some(descriptor);
        }
        self.descriptor
            .as_ref()
            .context("control plane connection unavailable")
    }
}

/// Schemas loaded for this invocation and the flags synthesized from them.
#[derive(Debug, Default)]
pub struct DynamicFlags {
    pub schemas: Vec<CanonicalSchema>,
    pub registry: FlagRegistry,
}

impl DynamicFlags {
    /// The schema flags are collected against. Commands without a schema
    /// get an empty one.
    pub fn primary(&self) -> CanonicalSchema {
        self.schemas
            .first()
            .cloned()
            .unwrap_or_else(|| CanonicalSchema::new(BTreeMap::new(), Vec::new()))
    }
}

/// Load the schemas a prescanned invocation needs.
pub async fn load_schemas(
    target: &DynamicTarget,
    session: &mut Session,
) -> anyhow::Result<Vec<CanonicalSchema>> {
    match target {
        DynamicTarget::Provider(provider) => {
            let schema = session
                .descriptor()
                .await?
                .fetch_provider_schema(provider)
                .await?;
            Ok(vec![schema])
        }
        DynamicTarget::Repo(name) => {
            let descriptor = session.descriptor().await?;
            let repo = descriptor.get_repo(name).await?;
            let schema = descriptor.fetch_provider_schema(&repo.provider).await?;
            Ok(vec![schema])
        }
        DynamicTarget::Files(files) => files
            .iter()
            .map(|f| param_schema::load_file(f).map_err(anyhow::Error::from))
            .collect(),
    }
}

/// Build the clap tree with schema flags attached to the subcommand at `path`.
pub fn build_command(
    path: &[String],
    schemas: &[CanonicalSchema],
    registry: &mut FlagRegistry,
) -> Result<Command, CtlError> {
    let mut root = CliArgs::command();
    if schemas.is_empty() {
        return Ok(root);
    }

    let mut reserved: Vec<String> = root
        .get_arguments()
        .filter(|a| a.is_global_set())
        .flat_map(|a| {
            std::iter::once(a.get_id().to_string()).chain(a.get_long().map(str::to_string))
        })
        .collect();
    reserved.extend(["help".to_string(), "version".to_string()]);

    let Some(target) = path
        .iter()
        .try_fold(&mut root, |cmd, name| cmd.find_subcommand_mut(name))
    else {
        return Ok(CliArgs::command());
    };

    // Required-ness is checked by the validator where input may be partial
    // or come from a values file
    let partial = matches!(
        path.iter().map(String::as_str).collect::<Vec<_>>().as_slice(),
        ["backup-repo", "update"] | ["schema", "validate"]
    );
    let mut cmd = std::mem::take(target);
    for schema in schemas {
        let synthesizer = Synthesizer::new(registry).reserve(reserved.iter().cloned());
        let synthesizer = if partial {
            synthesizer.without_required()
        } else {
            synthesizer
        };
        cmd = synthesizer.synthesize(cmd, schema)?;
    }
    *target = cmd;
    Ok(root)
}

/// Parse argv and run the selected command.
pub async fn run(argv: Vec<String>) -> anyhow::Result<()> {
    let scan = Prescan::scan(&argv);
    let mut conf = CtlConf::resolve(scan.config_file.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    conf.apply_overrides(
        scan.namespace.as_deref(),
        scan.kubeconfig.as_deref(),
        scan.context.as_deref(),
    );
    run_with(argv, scan, Session::new(conf)).await
}

pub async fn run_with(argv: Vec<String>, scan: Prescan, mut session: Session) -> anyhow::Result<()> {
    let schemas = match &scan.target {
        Some(target) => match load_schemas(target, &mut session).await {
            Ok(schemas) => schemas,
            Err(e) if Prescan::is_help_request(&argv) => {
                warn!("schema flags unavailable: {}", e);
                Vec::new()
            }
            Err(e) => return Err(e),
        },
        None => Vec::new(),
    };

    let mut registry = FlagRegistry::new();
    let cmd = build_command(&scan.path, &schemas, &mut registry)?;
    debug!("{} schema flags registered", registry.len());

    let matches = cmd.try_get_matches_from(&argv)?;
    let args = CliArgs::from_arg_matches(&matches)?;
    let leaf = leaf_matches(&matches);
    let dynamic = DynamicFlags { schemas, registry };

    match args.command {
        Commands::BackupRepo(cmd) => match cmd {
            BackupRepoCommands::Create(c) => c.execute(&mut session, &dynamic, leaf).await,
            BackupRepoCommands::Update(c) => c.execute(&mut session, &dynamic, leaf).await,
            BackupRepoCommands::List(c) => c.execute(&mut session).await,
            BackupRepoCommands::Describe(c) => c.execute(&mut session).await,
            BackupRepoCommands::Delete(c) => c.execute(&mut session).await,
        },
        Commands::Schema(cmd) => match cmd {
            SchemaCommands::Flags(c) => c.execute(&dynamic),
            SchemaCommands::Validate(c) => c.execute(&dynamic, leaf),
            SchemaCommands::Complete(c) => c.execute(&dynamic),
        },
    }
}

fn leaf_matches(matches: &ArgMatches) -> &ArgMatches {
    let mut current = matches;
    while let Some((_, sub)) = current.subcommand() {
        current = sub;
    }
    current
}
