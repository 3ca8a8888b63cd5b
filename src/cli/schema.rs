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

use super::DynamicFlags;
use crate::cli::display::{StatusIcon, TableRenderer};
use crate::domain::backup_repo::builder::merge_values;
use crate::domain::params::{collect, validate, CollectMode};
use clap::{ArgMatches, Parser};
use colored::Colorize;
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
pub struct FlagsCommand {
    /// Schema file (JSON or YAML); repeat to merge several, first wins
    #[arg(long, short = 'f', required = true)]
    pub file: Vec<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ValidateCommand {
    /// Schema file (JSON or YAML)
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// Values file (JSON or YAML); flags given on the command line override it
    #[arg(long, value_name = "PATH")]
    pub values: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompleteCommand {
    /// Schema file (JSON or YAML)
    #[arg(long, short = 'f', required = true)]
    pub file: Vec<PathBuf>,

    /// Flag name without the leading dashes
    pub flag: String,

    /// Only candidates starting with this prefix
    #[arg(default_value = "")]
    pub prefix: String,
}

impl FlagsCommand {
    pub fn execute(&self, dynamic: &DynamicFlags) -> anyhow::Result<()> {
        let renderer = TableRenderer::new();
        println!("{}", renderer.render_flags(&dynamic.registry));
        Ok(())
    }
}

impl ValidateCommand {
    pub fn execute(&self, dynamic: &DynamicFlags, matches: &ArgMatches) -> anyhow::Result<()> {
        let schema = dynamic.primary();

        // Schema defaults, then the values file, then flags typed by the user
        let mut values = Value::Object(schema.defaults());
        let from_file = match &self.values {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    anyhow::anyhow!("Failed to read values file {}: {}", path.display(), e)
                })?;
                let parsed: Value = serde_yaml::from_str(&content).map_err(|e| {
                    anyhow::anyhow!("Failed to parse values file {}: {}", path.display(), e)
                })?;
                match parsed {
                    Value::Object(_) => parsed,
                    Value::Null => Value::Object(Default::default()),
                    _ => anyhow::bail!("Values file {} must hold a mapping", path.display()),
                }
            }
            None => Value::Object(Default::default()),
        };

        merge_values(&mut values, from_file);
        let params = collect(matches, &schema, &dynamic.registry, CollectMode::Update)?;
        merge_values(&mut values, Value::Object(params.values));
        let Value::Object(values) = values else {
            anyhow::bail!("values must be a mapping");
        };

        validate(&schema, &values)?.into_result()?;

        println!("{} Parameters are valid", StatusIcon::SUCCESS.green());
        println!("{}", serde_yaml::to_string(&values)?);
        Ok(())
    }
}

impl CompleteCommand {
    pub fn execute(&self, dynamic: &DynamicFlags) -> anyhow::Result<()> {
        for candidate in dynamic.registry.complete(&self.flag, &self.prefix) {
            println!("{}", candidate);
        }
        Ok(())
    }
}
