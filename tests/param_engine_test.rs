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

use clap::error::ErrorKind;
use clap::Command;
use dbctl::domain::params::{collect, validate, validate_partial, CollectMode, FlagRegistry, Synthesizer};
use dbctl::domain::schema::normalize;
use dbctl::{CanonicalSchema, CtlError};
use serde_json::{json, Value};

mod test_utils {
    use super::*;

    pub fn schema(raw: Value) -> CanonicalSchema {
        normalize(&raw).expect("schema should normalize")
    }

    pub fn synthesize(schema: &CanonicalSchema) -> (Command, FlagRegistry) {
        let mut registry = FlagRegistry::new();
        let cmd = Synthesizer::new(&mut registry)
            .synthesize(Command::new("dbctl-test"), schema)
            .expect("synthesis should succeed");
        (cmd, registry)
    }

    pub fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("dbctl-test")
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect()
    }
}

use test_utils::*;

#[test]
fn test_round_trip_of_declared_defaults() {
    let schema = schema(json!({
        "type": "object",
        "properties": {
            "endpoint": {"type": "string", "default": "http://minio:9000"},
            "replicas": {"type": "integer", "default": 3},
            "ratio": {"type": "number", "default": 0.5},
            "pathStyle": {"type": "boolean", "default": false},
            "noDefault": {"type": "string"},
            "volume": {
                "type": "object",
                "properties": {
                    "storageClassName": {"type": "string", "default": "standard"},
                    "size": {"type": "integer", "default": 20},
                    "tls": {
                        "type": "object",
                        "properties": {
                            "enabled": {"type": "boolean", "default": true}
                        }
                    }
                }
            }
        }
    }));
    let (cmd, registry) = synthesize(&schema);

    let mut args = Vec::new();
    for spec in registry.iter() {
        if let Some(default) = &spec.default {
            let literal = match default {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            args.push(format!("--{}={}", spec.name, literal));
        }
    }
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let matches = cmd.try_get_matches_from(argv(&args)).unwrap();
    let collected = collect(&matches, &schema, &registry, CollectMode::Create).unwrap();

    assert_eq!(collected.values, schema.defaults());
    assert_eq!(
        Value::Object(collected.values),
        json!({
            "endpoint": "http://minio:9000",
            "replicas": 3,
            "ratio": 0.5,
            "pathStyle": false,
            "volume": {
                "storageClassName": "standard",
                "size": 20,
                "tls": {"enabled": true}
            }
        })
    );
}

#[test]
fn test_required_scalar_is_enforced_by_parser() {
    let schema = schema(json!({
        "type": "object",
        "properties": {
            "bucket": {"type": "string", "default": "ignored"},
            "region": {"type": "string"}
        },
        "required": ["bucket"]
    }));
    let (cmd, _) = synthesize(&schema);

    let err = cmd
        .clone()
        .try_get_matches_from(argv(&["--region", "us-east-1"]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

    assert!(cmd.try_get_matches_from(argv(&["--bucket", "b"])).is_ok());
}

#[test]
fn test_credential_routing() {
    let schema = schema(json!({
        "openAPIV3Schema": {
            "type": "object",
            "properties": {
                "user": {"type": "string"},
                "password": {"type": "string"}
            }
        },
        "credentialFields": ["password"]
    }));
    let (cmd, registry) = synthesize(&schema);

    let matches = cmd
        .try_get_matches_from(argv(&["--user=admin", "--password=secret123"]))
        .unwrap();
    let collected = collect(&matches, &schema, &registry, CollectMode::Create).unwrap();

    assert_eq!(collected.credential.get("password").unwrap(), "secret123");
    assert!(!collected.config.contains_key("password"));
    assert!(!collected
        .config
        .values()
        .any(|v| v == &Value::String("secret123".to_string())));
    assert_eq!(collected.config.get("user"), Some(&json!("admin")));
}

#[test]
fn test_kebab_dot_naming() {
    let schema = schema(json!({
        "type": "object",
        "properties": {
            "volume": {
                "type": "object",
                "properties": {"storageClassName": {"type": "string"}}
            }
        }
    }));
    let (cmd, registry) = synthesize(&schema);

    assert!(registry.contains("volume.storage-class-name"));
    let matches = cmd
        .try_get_matches_from(argv(&["--volume.storage-class-name", "fast"]))
        .unwrap();
    let collected = collect(&matches, &schema, &registry, CollectMode::Create).unwrap();
    assert_eq!(
        Value::Object(collected.values),
        json!({"volume": {"storageClassName": "fast"}})
    );
}

#[test]
fn test_array_of_array_fails_whole_synthesis() {
    let raw = json!({
        "type": "object",
        "properties": {
            "alpha": {"type": "string"},
            "matrix": {
                "type": "array",
                "items": {"type": "array", "items": {"type": "string"}}
            }
        }
    });

    // Rejected at normalization, before any flag exists
    match normalize(&raw) {
        Err(CtlError::UnsupportedSchema { path, .. }) => assert_eq!(path, "matrix"),
        other => panic!("expected UnsupportedSchema, got {:?}", other),
    }
}

#[test]
fn test_enum_validation_names_the_flag() {
    let schema = schema(json!({
        "type": "object",
        "properties": {
            "mode": {"type": "string", "enum": ["Serial", "Parallel"]}
        }
    }));
    let (cmd, registry) = synthesize(&schema);
    assert_eq!(registry.complete("mode", "P"), vec!["Parallel"]);

    let matches = cmd.try_get_matches_from(argv(&["--mode=Bogus"])).unwrap();
    let collected = collect(&matches, &schema, &registry, CollectMode::Create).unwrap();
    let errors = validate(&schema, &collected.values).unwrap();

    assert_eq!(errors.len(), 1);
    let error = errors.iter().next().unwrap();
    assert_eq!(error.field, "mode");
    assert!(error.to_string().starts_with("--mode: "));
}

#[test]
fn test_update_mode_partiality() {
    let full = schema(json!({
        "type": "object",
        "properties": {
            "a": {"type": "integer", "default": 1},
            "b": {"type": "integer", "default": 2}
        },
        "required": ["a", "b"]
    }));
    let mut registry = FlagRegistry::new();
    let cmd = Synthesizer::new(&mut registry)
        .without_required()
        .synthesize(Command::new("dbctl-test"), &full)
        .unwrap();

    let matches = cmd.try_get_matches_from(argv(&["--a=9"])).unwrap();
    let collected = collect(&matches, &full, &registry, CollectMode::Update).unwrap();
    assert_eq!(Value::Object(collected.values.clone()), json!({"a": 9}));

    assert!(validate_partial(&full, &collected.values).unwrap().is_empty());
    assert!(!validate(&full, &collected.values).unwrap().is_empty());
}

#[test]
fn test_openapi_and_kubernetes_shapes_synthesize_alike() {
    let openapi = schema(json!({
        "type": "object",
        "properties": {
            "tags": {"type": "array", "items": {"type": "string"}},
            "limits": {"type": "object", "properties": {"cpu": {"type": "number"}}}
        }
    }));
    let kubernetes = schema(json!({
        "type": "object",
        "x-kubernetes-preserve-unknown-fields": false,
        "properties": {
            "tags": {"type": "array", "items": {"type": "string"}},
            "limits": {"type": "object", "properties": {"cpu": {"type": "number"}}}
        }
    }));

    let (_, a) = synthesize(&openapi);
    let (_, b) = synthesize(&kubernetes);
    let names = |r: &FlagRegistry| r.iter().map(|s| s.name.clone()).collect::<Vec<_>>();
    assert_eq!(names(&a), names(&b));
    assert_eq!(names(&a), vec!["limits.cpu", "tags"]);
}

#[test]
fn test_non_finite_numbers_are_rejected() {
    let schema = schema(json!({
        "type": "object",
        "properties": {
            "ratio": {"type": "number", "maximum": 1},
            "weights": {"type": "array", "items": {"type": "number"}}
        }
    }));
    let (cmd, _) = synthesize(&schema);

    for arg in ["--ratio=NaN", "--ratio=inf", "--weights=0.5,-inf"] {
        let err = cmd.clone().try_get_matches_from(argv(&[arg])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation, "{}", arg);
    }

    let (cmd, registry) = synthesize(&schema);
    let matches = cmd.try_get_matches_from(argv(&["--ratio=2"])).unwrap();
    let collected = collect(&matches, &schema, &registry, CollectMode::Update).unwrap();
    let errors = validate_partial(&schema, &collected.values).unwrap();
    assert_eq!(errors.iter().next().unwrap().field, "ratio");
}
