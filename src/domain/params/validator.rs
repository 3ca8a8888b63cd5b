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

//! Validation of collected values against the schema they were synthesized
//! from. Errors name the offending flag rather than the JSON path.

use crate::domain::schema::{naming, CanonicalSchema, ValueMap};
use crate::shared::error::CtlError;
use jsonschema::error::ValidationErrorKind;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Flag name without the leading dashes.
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "--{}: {}", self.field, self.message)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn into_result(self) -> Result<(), CtlError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CtlError::Validation(self))
        }
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

/// Validate a complete value map.
pub fn validate(schema: &CanonicalSchema, values: &ValueMap) -> Result<ValidationErrors, CtlError> {
    run(schema.root.to_json_schema(true), values)
}

/// Validate a partial value map: types, enums and bounds are checked but
/// `required` is not.
pub fn validate_partial(
    schema: &CanonicalSchema,
    values: &ValueMap,
) -> Result<ValidationErrors, CtlError> {
    run(schema.root.to_json_schema(false), values)
}

fn run(document: Value, values: &ValueMap) -> Result<ValidationErrors, CtlError> {
    let validator = jsonschema::validator_for(&document)
        .map_err(|e| CtlError::InvalidSchema(e.to_string()))?;

    let instance = Value::Object(values.clone());
    let errors = validator
        .iter_errors(&instance)
        .map(|err| {
            let mut segments = pointer_segments(&err.instance_path.to_string());
            if let ValidationErrorKind::Required { property } = &err.kind {
                if let Some(name) = property.as_str() {
                    segments.push(name.to_string());
                }
            }
            ValidationError {
                field: naming::flag_name(&segments),
                message: clean_message(&err.to_string()),
            }
        })
        .collect::<Vec<_>>();
    Ok(errors.into())
}

/// Split a JSON pointer into property names, dropping array indices.
fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .filter(|s| !s.is_empty())
        .filter(|s| !s.chars().all(|c| c.is_ascii_digit()))
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect()
}

fn clean_message(message: &str) -> String {
    message.replace(" in body", "").trim().to_string()
}
