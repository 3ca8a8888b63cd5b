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

//! Turns a parameter schema into clap flags.
//!
//! Objects flatten into dotted flag names, arrays of scalars become
//! repeatable slice flags and arrays of objects flatten their properties under
//! the array's own name. Synthesis either attaches every planned flag or none:
//! an unsupported property anywhere leaves the command untouched.

use super::registry::{FlagRegistry, FlagSpec};
use crate::domain::schema::{naming, CanonicalSchema, SchemaKind, SchemaNode};
use crate::shared::error::CtlError;
use clap::Command;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub struct Synthesizer<'a> {
    registry: &'a mut FlagRegistry,
    reserved: BTreeSet<String>,
    enforce_required: bool,
}

impl<'a> Synthesizer<'a> {
    pub fn new(registry: &'a mut FlagRegistry) -> Self {
        Self {
            registry,
            reserved: BTreeSet::new(),
            enforce_required: true,
        }
    }

    /// Leave every flag optional, for commands that take partial input.
    pub fn without_required(mut self) -> Self {
        self.enforce_required = false;
        self
    }

    /// Names the schema must not claim even though `cmd` does not define
    /// them yet, such as global flags propagated at parse time.
    pub fn reserve<I: IntoIterator<Item = String>>(mut self, names: I) -> Self {
        self.reserved.extend(names);
        self
    }

    /// Add the schema's flags to `cmd`. Flags whose name is already known to
    /// the registry or the command are skipped.
    pub fn synthesize(self, cmd: Command, schema: &CanonicalSchema) -> Result<Command, CtlError> {
        let mut taken: BTreeSet<String> = cmd
            .get_arguments()
            .flat_map(|arg| {
                let id = arg.get_id().to_string();
                std::iter::once(id).chain(arg.get_long().map(str::to_string))
            })
            .collect();
        taken.extend(self.reserved.iter().cloned());

        let mut planner = Planner {
            registry: self.registry,
            taken: &taken,
            planned: Vec::new(),
        };
        planner.plan_properties(schema.properties(), "", &[])?;
        let mut planned = planner.planned;

        // Required objects and arrays are left to validation, flattening
        // makes their required-ness unenforceable per flag.
        let required: &[String] = if self.enforce_required {
            schema.required()
        } else {
            &[]
        };
        for required in required {
            let Some(node) = schema.properties().get(required) else {
                continue;
            };
            if node.scalar_type().is_none() {
                continue;
            }
            let name = naming::flag_segment(required);
            if let Some(spec) = planned.iter_mut().find(|spec| spec.name == name) {
                spec.required = true;
                spec.default = None;
            }
        }

        let mut cmd = cmd;
        for spec in planned {
            debug!(
                "registering flag --{} ({}{})",
                spec.name,
                spec.type_label(),
                if spec.required { ", required" } else { "" }
            );
            cmd = cmd.arg(spec.to_arg());
            self.registry.insert(spec);
        }
        Ok(cmd)
    }
}

struct Planner<'r, 't> {
    registry: &'r FlagRegistry,
    taken: &'t BTreeSet<String>,
    planned: Vec<FlagSpec>,
}

impl Planner<'_, '_> {
    fn plan_properties(
        &mut self,
        properties: &BTreeMap<String, SchemaNode>,
        prefix: &str,
        path: &[String],
    ) -> Result<(), CtlError> {
        for (key, node) in properties {
            let name = naming::join(prefix, key);
            let mut node_path = path.to_vec();
            node_path.push(key.clone());

            match &node.kind {
                SchemaKind::Null => debug!("skipping null property {}", name),
                SchemaKind::Scalar(scalar) => {
                    let default = node.typed_default();
                    self.push(FlagSpec::for_leaf(
                        name, node_path, *scalar, false, node, default,
                    ));
                }
                SchemaKind::Object { properties, .. } => {
                    self.plan_properties(properties, &name, &node_path)?;
                }
                SchemaKind::Array(items) => self.plan_array(node, items, name, node_path)?,
            }
        }
        Ok(())
    }

    fn plan_array(
        &mut self,
        node: &SchemaNode,
        items: &SchemaNode,
        name: String,
        path: Vec<String>,
    ) -> Result<(), CtlError> {
        match &items.kind {
            SchemaKind::Array(_) => Err(CtlError::unsupported(
                name,
                "array nested in array is not supported",
            )),
            SchemaKind::Null => {
                debug!("skipping array of null {}", name);
                Ok(())
            }
            SchemaKind::Scalar(scalar) => {
                let mut describe = items.clone();
                if describe.description.is_empty() {
                    describe.description = node.description.clone();
                }
                let default = node.default.as_ref().map(|raw| {
                    let values = match raw {
                        serde_json::Value::Array(values) => values.clone(),
                        single => vec![single.clone()],
                    };
                    serde_json::Value::Array(
                        values
                            .iter()
                            .map(|v| scalar.cast(v).unwrap_or_else(|| scalar.zero_value()))
                            .collect(),
                    )
                });
                self.push(FlagSpec::for_leaf(
                    name, path, *scalar, true, &describe, default,
                ));
                Ok(())
            }
            // One unnamed element per invocation, flattened under the array's name
            SchemaKind::Object { properties, .. } => {
                self.plan_properties(properties, &name, &path)
            }
        }
    }

    fn push(&mut self, spec: FlagSpec) {
        if self.registry.contains(&spec.name)
            || self.taken.contains(&spec.name)
            || self.planned.iter().any(|p| p.name == spec.name)
        {
            debug!("flag --{} already registered, skipping", spec.name);
            return;
        }
        self.planned.push(spec);
    }
}
