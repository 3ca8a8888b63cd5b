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

use super::registry::FlagRegistry;
use crate::domain::schema::{naming, CanonicalSchema, ScalarType, SchemaKind, SchemaNode, ValueMap};
use crate::shared::error::CtlError;
use clap::parser::ValueSource;
use clap::ArgMatches;
use serde_json::{Number, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectMode {
    /// Values typed by the user and schema defaults.
    Create,
    /// Only values typed by the user.
    Update,
}

/// Values read back from a parsed command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedParams {
    /// Everything collected, shaped like the schema.
    pub values: ValueMap,
    /// `values` without the credential fields.
    pub config: ValueMap,
    /// Credential fields, stringified.
    pub credential: BTreeMap<String, String>,
}

impl CollectedParams {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rebuild the nested value map from flags synthesized for `schema`. Only
/// flags recorded in `registry` are read.
pub fn collect(
    matches: &ArgMatches,
    schema: &CanonicalSchema,
    registry: &FlagRegistry,
    mode: CollectMode,
) -> Result<CollectedParams, CtlError> {
    let reader = Reader {
        matches,
        registry,
        mode,
    };
    let values = reader.object(schema.properties(), "")?;

    let credential_fields: BTreeSet<&str> =
        schema.credential_fields.iter().map(String::as_str).collect();
    let mut config = ValueMap::new();
    let mut credential = BTreeMap::new();
    for (key, value) in &values {
        if credential_fields.contains(key.as_str()) {
            credential.insert(key.clone(), stringify_value(value));
        } else {
            config.insert(key.clone(), value.clone());
        }
    }

    Ok(CollectedParams {
        values,
        config,
        credential,
    })
}

struct Reader<'m> {
    matches: &'m ArgMatches,
    registry: &'m FlagRegistry,
    mode: CollectMode,
}

impl Reader<'_> {
    fn object(
        &self,
        properties: &BTreeMap<String, SchemaNode>,
        prefix: &str,
    ) -> Result<ValueMap, CtlError> {
        let mut out = ValueMap::new();
        for (key, node) in properties {
            let name = naming::join(prefix, key);
            let value = match &node.kind {
                SchemaKind::Null => None,
                SchemaKind::Scalar(scalar) => self.one(&name, *scalar)?,
                SchemaKind::Object { properties, .. } => {
                    let nested = self.object(properties, &name)?;
                    (!nested.is_empty()).then_some(Value::Object(nested))
                }
                SchemaKind::Array(items) => match &items.kind {
                    SchemaKind::Scalar(scalar) => self.many(&name, *scalar)?,
                    SchemaKind::Object { properties, .. } => {
                        let element = self.object(properties, &name)?;
                        (!element.is_empty()).then(|| Value::Array(vec![Value::Object(element)]))
                    }
                    _ => None,
                },
            };
            if let Some(value) = value {
                debug!("collected --{} = {}", name, value);
                out.insert(key.clone(), value);
            }
        }
        Ok(out)
    }

    /// Whether the flag has a value worth reading in this mode. A name the
    /// registry does not hold belongs to a static or global flag and reads
    /// as absent.
    fn is_set(&self, name: &str) -> bool {
        if !self.registry.contains(name) {
            return false;
        }
        match self.matches.try_contains_id(name) {
            Ok(true) => match self.mode {
                CollectMode::Create => true,
                CollectMode::Update => {
                    self.matches.value_source(name) == Some(ValueSource::CommandLine)
                }
            },
            _ => false,
        }
    }

    fn one(&self, name: &str, scalar: ScalarType) -> Result<Option<Value>, CtlError> {
        if !self.is_set(name) {
            return Ok(None);
        }
        let matches = self.matches;
        let value = match scalar {
            ScalarType::String => matches
                .try_get_one::<String>(name)
                .map_err(|e| flag_error(name, e))?
                .map(|v| Value::String(v.clone())),
            ScalarType::Integer => matches
                .try_get_one::<i64>(name)
                .map_err(|e| flag_error(name, e))?
                .map(|v| Value::from(*v)),
            ScalarType::Number => matches
                .try_get_one::<f64>(name)
                .map_err(|e| flag_error(name, e))?
                .map(|v| finite(name, *v))
                .transpose()?,
            ScalarType::Boolean => matches
                .try_get_one::<bool>(name)
                .map_err(|e| flag_error(name, e))?
                .map(|v| Value::Bool(*v)),
        };
        Ok(value)
    }

    fn many(&self, name: &str, scalar: ScalarType) -> Result<Option<Value>, CtlError> {
        if !self.is_set(name) {
            return Ok(None);
        }
        let matches = self.matches;
        let values: Option<Vec<Value>> = match scalar {
            ScalarType::String => matches
                .try_get_many::<String>(name)
                .map_err(|e| flag_error(name, e))?
                .map(|vs| vs.map(|v| Value::String(v.clone())).collect()),
            ScalarType::Integer => matches
                .try_get_many::<i64>(name)
                .map_err(|e| flag_error(name, e))?
                .map(|vs| vs.map(|v| Value::from(*v)).collect()),
            ScalarType::Number => matches
                .try_get_many::<f64>(name)
                .map_err(|e| flag_error(name, e))?
                .map(|vs| vs.map(|v| finite(name, *v)).collect::<Result<_, _>>())
                .transpose()?,
            ScalarType::Boolean => matches
                .try_get_many::<bool>(name)
                .map_err(|e| flag_error(name, e))?
                .map(|vs| vs.map(|v| Value::Bool(*v)).collect()),
        };
        Ok(values.map(Value::Array))
    }
}

fn finite(name: &str, value: f64) -> Result<Value, CtlError> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| CtlError::Flag(format!("--{}: '{}' is not a finite number", name, value)))
}

fn flag_error(name: &str, err: clap::parser::MatchesError) -> CtlError {
    CtlError::Flag(format!("--{}: {}", name, err))
}

/// Render a collected value for a string-only sink such as a Secret or the
/// BackupRepo config map. Composite values are written as compact JSON.
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
