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

use crate::domain::schema::{ScalarType, SchemaNode};
use clap::{value_parser, Arg, ArgAction};
use serde_json::Value;
use std::collections::BTreeMap;

/// A flag planned from one schema leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagSpec {
    pub name: String,
    /// Schema property path the flag was derived from.
    pub path: Vec<String>,
    pub value_type: ScalarType,
    /// Repeatable, comma-delimited slice flag (array of scalars).
    pub repeated: bool,
    pub help: String,
    pub default: Option<Value>,
    pub required: bool,
    /// Shell-completion candidates, taken from the schema enum.
    pub completions: Vec<String>,
}

impl FlagSpec {
    /// Plan a flag for a scalar leaf. `describe` supplies the help text and
    /// completions; for an array of scalars it is the item schema.
    pub fn for_leaf(
        name: String,
        path: Vec<String>,
        value_type: ScalarType,
        repeated: bool,
        describe: &SchemaNode,
        default: Option<Value>,
    ) -> Self {
        Self {
            name,
            path,
            value_type,
            repeated,
            help: help_text(describe),
            default,
            required: false,
            completions: describe.enum_values.iter().map(literal).collect(),
        }
    }

    pub fn value_name(&self) -> &'static str {
        match self.value_type {
            ScalarType::String => "STRING",
            ScalarType::Integer => "INT",
            ScalarType::Number => "FLOAT",
            ScalarType::Boolean => "BOOL",
        }
    }

    pub fn type_label(&self) -> String {
        if self.repeated {
            format!("[]{}", self.value_type.as_str())
        } else {
            self.value_type.as_str().to_string()
        }
    }

    /// Build the clap argument for this flag.
    pub fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.name.clone())
            .long(self.name.clone())
            .value_name(self.value_name())
            .help(self.help.clone());

        arg = match self.value_type {
            ScalarType::String => arg.value_parser(value_parser!(String)),
            ScalarType::Integer => arg.value_parser(value_parser!(i64)),
            ScalarType::Number => arg.value_parser(parse_finite),
            ScalarType::Boolean => arg.value_parser(value_parser!(bool)),
        };

        arg = if self.repeated {
            arg.action(ArgAction::Append).value_delimiter(',')
        } else if self.value_type == ScalarType::Boolean {
            // `--flag` alone means true, `--flag=false` turns it off
            arg.action(ArgAction::Set)
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
        } else {
            arg.action(ArgAction::Set)
        };

        if self.required {
            return arg.required(true);
        }

        match &self.default {
            Some(Value::Array(items)) => {
                arg.default_values(items.iter().map(literal).collect::<Vec<_>>())
            }
            Some(value) => arg.default_value(literal(value)),
            None => arg,
        }
    }
}

/// Flags registered while building one command.
///
/// Synthesizing several schemas into the same command goes through one
/// registry; a flag name already present is skipped.
#[derive(Debug, Default)]
pub struct FlagRegistry {
    flags: BTreeMap<String, FlagSpec>,
}

impl FlagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FlagSpec> {
        self.flags.get(name)
    }

    pub fn insert(&mut self, spec: FlagSpec) {
        self.flags.insert(spec.name.clone(), spec);
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlagSpec> {
        self.flags.values()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Completion candidates for `flag` starting with `prefix`.
    pub fn complete(&self, flag: &str, prefix: &str) -> Vec<&str> {
        self.flags
            .get(flag)
            .map(|spec| {
                spec.completions
                    .iter()
                    .map(String::as_str)
                    .filter(|c| c.starts_with(prefix))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn help_text(node: &SchemaNode) -> String {
    let mut help = node.description.trim().to_string();
    if !node.enum_values.is_empty() {
        let legal: Vec<String> = node.enum_values.iter().map(literal).collect();
        help = format!("{} Legal values [{}].", help, legal.join(", "));
    }
    if node.minimum.is_some() || node.maximum.is_some() {
        let min = node
            .minimum
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-inf".to_string());
        let max = node
            .maximum
            .map(|v| v.to_string())
            .unwrap_or_else(|| "+inf".to_string());
        help = format!("{} Value range [{}, {}].", help, min, max);
    }
    help.trim().to_string()
}

/// JSON has no NaN or infinity, so a number flag must be finite.
fn parse_finite(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("invalid number '{}': {}", raw, e))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("'{}' is not a finite number", raw))
    }
}

/// Render a JSON literal the way a user would type it on the command line.
pub(crate) fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_help_text() {
        let node = SchemaNode::scalar(ScalarType::String)
            .with_description("Deletion mode")
            .with_enum(vec![json!("Serial"), json!("Parallel")]);
        assert_eq!(help_text(&node), "Deletion mode Legal values [Serial, Parallel].");

        let node = SchemaNode::scalar(ScalarType::Integer)
            .with_description("Replicas")
            .with_range(Some(1.0), None);
        assert_eq!(help_text(&node), "Replicas Value range [1, +inf].");

        let node = SchemaNode::scalar(ScalarType::Integer).with_range(None, Some(10.0));
        assert_eq!(help_text(&node), "Value range [-inf, 10].");
    }

    #[test]
    fn test_registry_complete() {
        let node = SchemaNode::scalar(ScalarType::String)
            .with_enum(vec![json!("Serial"), json!("Parallel"), json!("Sequential")]);
        let spec = FlagSpec::for_leaf(
            "mode".to_string(),
            vec!["mode".to_string()],
            ScalarType::String,
            false,
            &node,
            None,
        );

        let mut registry = FlagRegistry::new();
        registry.insert(spec);
        assert_eq!(registry.complete("mode", "Se"), vec!["Serial", "Sequential"]);
        assert!(registry.complete("unknown", "").is_empty());
    }

    #[test]
    fn test_number_flags_must_be_finite() {
        assert_eq!(parse_finite("0.25"), Ok(0.25));
        assert_eq!(parse_finite("-3"), Ok(-3.0));
        for raw in ["NaN", "inf", "-infinity", "1e400", "abc"] {
            assert!(parse_finite(raw).is_err(), "{} should be rejected", raw);
        }

        let node = SchemaNode::scalar(ScalarType::Number);
        let spec = FlagSpec::for_leaf(
            "ratio".to_string(),
            vec!["ratio".to_string()],
            ScalarType::Number,
            false,
            &node,
            None,
        );
        let cmd = clap::Command::new("test").arg(spec.to_arg());
        assert!(cmd.clone().try_get_matches_from(["test", "--ratio=NaN"]).is_err());
        assert!(cmd.try_get_matches_from(["test", "--ratio=0.5"]).is_ok());
    }

    #[test]
    fn test_required_flag_drops_default() {
        let node = SchemaNode::scalar(ScalarType::String);
        let mut spec = FlagSpec::for_leaf(
            "bucket".to_string(),
            vec!["bucket".to_string()],
            ScalarType::String,
            false,
            &node,
            Some(json!("backups")),
        );
        spec.required = true;

        let arg = spec.to_arg();
        assert!(arg.is_required_set());
        assert!(arg.get_default_values().is_empty());
    }
}
