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

// CLI command definitions

use super::backup_repo::{
    CreateCommand, DeleteCommand, DescribeCommand, ListCommand, UpdateCommand,
};
use super::schema::{CompleteCommand, FlagsCommand, ValidateCommand};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dbctl",
    version,
    about = "Command-line client for the database control plane",
    long_about = "A command-line client for a Kubernetes-based database control plane. \
        Commands backed by a parameter schema grow their flags from that schema."
)]
pub struct CliArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Namespace for credential secrets (default: kb-system)
    #[arg(long, short = 'n', global = true)]
    pub namespace: Option<String>,

    /// Path to kubeconfig file
    /// If not specified, uses default kubeconfig resolution (KUBECONFIG env or ~/.kube/config)
    #[arg(long, global = true)]
    pub kubeconfig: Option<String>,

    /// Kubernetes context to use
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// dbctl configuration file (default: $DBCTL_CONFIG or ~/.dbctl/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage backup repositories
    #[command(subcommand)]
    BackupRepo(BackupRepoCommands),

    /// Inspect parameter schemas and check values against them
    #[command(subcommand)]
    Schema(SchemaCommands),
}

#[derive(Subcommand, Debug)]
pub enum BackupRepoCommands {
    /// Create a backup repository; storage provider parameters become flags
    Create(CreateCommand),

    /// Update an existing backup repository (only the flags given change)
    Update(UpdateCommand),

    /// List backup repositories
    List(ListCommand),

    /// Show a backup repository
    Describe(DescribeCommand),

    /// Delete a backup repository and its credential secret
    Delete(DeleteCommand),
}

#[derive(Subcommand, Debug)]
pub enum SchemaCommands {
    /// Show the flags synthesized from one or more schema files
    Flags(FlagsCommand),

    /// Validate values against a schema file
    Validate(ValidateCommand),

    /// Print completion candidates for a synthesized flag
    Complete(CompleteCommand),
}
