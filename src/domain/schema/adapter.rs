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

//! Normalizes the two wire shapes a parameter schema can arrive in into a
//! [`CanonicalSchema`]:
//!
//! - apiextensions `JSONSchemaProps`, either bare or wrapped in a parameters
//!   schema (`openAPIV3Schema` + `credentialFields`) as stored on a
//!   StorageProvider
//! - an OpenAPI `Schema`, the shape of a chart's `values.schema.json`
//!
//! The shape is recognized from the document itself.

use super::model::{CanonicalSchema, ScalarType, SchemaKind, SchemaNode};
use super::naming;
use crate::shared::error::CtlError;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    JSONSchemaProps, JSONSchemaPropsOrArray,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Parameters schema wrapper as stored on a StorageProvider.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParametersSchema {
    #[serde(rename = "openAPIV3Schema")]
    pub open_api_v3_schema: JSONSchemaProps,
    #[serde(default)]
    pub credential_fields: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OpenApiItems {
    Schema(Box<OpenApiSchema>),
    Tuple(Vec<OpenApiSchema>),
}

/// OpenAPI / JSON Schema object, limited to the keywords the engine reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenApiSchema {
    #[serde(rename = "type")]
    pub type_: Option<TypeSet>,
    #[serde(default)]
    pub properties: BTreeMap<String, OpenApiSchema>,
    pub items: Option<OpenApiItems>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(rename = "enum", default)]
    pub enum_values: Vec<Value>,
    pub default: Option<Value>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub description: Option<String>,
    #[serde(default)]
    pub nullable: bool,
    pub one_of: Option<Vec<Value>>,
    pub any_of: Option<Vec<Value>>,
    pub all_of: Option<Vec<Value>>,
    pub not: Option<Value>,
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
}

/// Read access to a wire schema node, implemented for both wire shapes.
trait SchemaSource: Sized {
    fn first_type(&self) -> Option<&str>;
    fn property_list(&self) -> Vec<(&str, &Self)>;
    /// `Err` when `items` is a tuple of schemas.
    fn item_schema(&self) -> std::result::Result<Option<&Self>, ()>;
    fn required_list(&self) -> Vec<String>;
    fn enum_list(&self) -> Vec<Value>;
    fn default_value(&self) -> Option<Value>;
    fn bounds(&self) -> (Option<f64>, Option<f64>);
    fn description_text(&self) -> &str;
    fn is_nullable(&self) -> bool;
    /// Name of the first composition keyword present, if any.
    fn composition(&self) -> Option<&'static str>;
}

impl SchemaSource for JSONSchemaProps {
    fn first_type(&self) -> Option<&str> {
        self.type_.as_deref()
    }

    fn property_list(&self) -> Vec<(&str, &Self)> {
        self.properties
            .iter()
            .flatten()
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }

    fn item_schema(&self) -> std::result::Result<Option<&Self>, ()> {
        match &self.items {
            None => Ok(None),
            Some(JSONSchemaPropsOrArray::Schema(s)) => Ok(Some(s.as_ref())),
            Some(JSONSchemaPropsOrArray::Schemas(_)) => Err(()),
        }
    }

    fn required_list(&self) -> Vec<String> {
        self.required.clone().unwrap_or_default()
    }

    fn enum_list(&self) -> Vec<Value> {
        self.enum_
            .iter()
            .flatten()
            .map(|json| json.0.clone())
            .collect()
    }

    fn default_value(&self) -> Option<Value> {
        self.default.as_ref().map(|json| json.0.clone())
    }

    fn bounds(&self) -> (Option<f64>, Option<f64>) {
        (self.minimum, self.maximum)
    }

    fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(false)
    }

    fn composition(&self) -> Option<&'static str> {
        if self.one_of.is_some() {
            Some("oneOf")
        } else if self.any_of.is_some() {
            Some("anyOf")
        } else if self.all_of.is_some() {
            Some("allOf")
        } else if self.not.is_some() {
            Some("not")
        } else if self.ref_path.is_some() {
            Some("$ref")
        } else {
            None
        }
    }
}

impl SchemaSource for OpenApiSchema {
    fn first_type(&self) -> Option<&str> {
        match &self.type_ {
            Some(TypeSet::One(t)) => Some(t.as_str()),
            Some(TypeSet::Many(types)) => types.first().map(String::as_str),
            None => None,
        }
    }

    fn property_list(&self) -> Vec<(&str, &Self)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }

    fn item_schema(&self) -> std::result::Result<Option<&Self>, ()> {
        match &self.items {
            None => Ok(None),
            Some(OpenApiItems::Schema(s)) => Ok(Some(s.as_ref())),
            Some(OpenApiItems::Tuple(_)) => Err(()),
        }
    }

    fn required_list(&self) -> Vec<String> {
        self.required.clone()
    }

    fn enum_list(&self) -> Vec<Value> {
        self.enum_values.clone()
    }

    fn default_value(&self) -> Option<Value> {
        self.default.clone()
    }

    fn bounds(&self) -> (Option<f64>, Option<f64>) {
        (self.minimum, self.maximum)
    }

    fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    fn is_nullable(&self) -> bool {
        self.nullable
            || matches!(&self.type_, Some(TypeSet::Many(types)) if types.iter().any(|t| t == "null"))
    }

    fn composition(&self) -> Option<&'static str> {
        if self.one_of.is_some() {
            Some("oneOf")
        } else if self.any_of.is_some() {
            Some("anyOf")
        } else if self.all_of.is_some() {
            Some("allOf")
        } else if self.not.is_some() {
            Some("not")
        } else if self.reference.is_some() {
            Some("$ref")
        } else {
            None
        }
    }
}

/// Normalize a raw schema document into a [`CanonicalSchema`].
pub fn normalize(raw: &Value) -> Result<CanonicalSchema, CtlError> {
    if raw.get("openAPIV3Schema").is_some() {
        let wrapper: ParametersSchema = serde_json::from_value(raw.clone())
            .map_err(|e| CtlError::InvalidSchema(format!("parameters schema: {}", e)))?;
        tracing::debug!("normalizing parameters schema (apiextensions)");
        return from_json_schema_props(&wrapper.open_api_v3_schema, wrapper.credential_fields);
    }

    if has_kubernetes_extensions(raw) {
        let props: JSONSchemaProps = serde_json::from_value(raw.clone())
            .map_err(|e| CtlError::InvalidSchema(format!("JSONSchemaProps: {}", e)))?;
        tracing::debug!("normalizing apiextensions JSONSchemaProps");
        return from_json_schema_props(&props, Vec::new());
    }

    let schema: OpenApiSchema = serde_json::from_value(raw.clone())
        .map_err(|e| CtlError::InvalidSchema(format!("OpenAPI schema: {}", e)))?;
    tracing::debug!("normalizing OpenAPI schema");
    from_openapi(&schema)
}

pub fn from_json_schema_props(
    props: &JSONSchemaProps,
    credential_fields: Vec<String>,
) -> Result<CanonicalSchema, CtlError> {
    build(props, credential_fields)
}

pub fn from_openapi(schema: &OpenApiSchema) -> Result<CanonicalSchema, CtlError> {
    build(schema, Vec::new())
}

/// Load a schema document from a JSON or YAML file.
pub fn load_file(path: impl AsRef<Path>) -> Result<CanonicalSchema, CtlError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    // YAML is a superset of JSON, one parser covers both
    let raw: Value = serde_yaml::from_str(&content)?;
    normalize(&raw).map_err(|e| match e {
        CtlError::InvalidSchema(msg) => {
            CtlError::InvalidSchema(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}

fn build<S: SchemaSource>(
    source: &S,
    credential_fields: Vec<String>,
) -> Result<CanonicalSchema, CtlError> {
    let root = convert(source, "")?;
    if !matches!(root.kind, SchemaKind::Object { .. }) {
        return Err(CtlError::InvalidSchema(
            "root schema must be an object".to_string(),
        ));
    }

    let schema = CanonicalSchema {
        root,
        credential_fields,
    };
    if let Some(unknown) = schema
        .credential_fields
        .iter()
        .find(|f| !schema.properties().contains_key(f.as_str()))
    {
        return Err(CtlError::InvalidSchema(format!(
            "credential field '{}' is not a top-level property",
            unknown
        )));
    }
    Ok(schema)
}

fn convert<S: SchemaSource>(source: &S, path: &str) -> Result<SchemaNode, CtlError> {
    let display_path = if path.is_empty() { "<root>" } else { path };
    if let Some(keyword) = source.composition() {
        return Err(CtlError::unsupported(
            display_path,
            format!("'{}' is not supported", keyword),
        ));
    }

    let items = source
        .item_schema()
        .map_err(|_| CtlError::unsupported(display_path, "tuple-style items are not supported"))?;
    let properties = source.property_list();

    let type_name = match source.first_type() {
        Some(t) => t,
        None if !properties.is_empty() => "object",
        None if items.is_some() => "array",
        None => "string",
    };

    let kind = match type_name {
        "null" => SchemaKind::Null,
        "string" => SchemaKind::Scalar(ScalarType::String),
        "integer" => SchemaKind::Scalar(ScalarType::Integer),
        "number" => SchemaKind::Scalar(ScalarType::Number),
        "boolean" => SchemaKind::Scalar(ScalarType::Boolean),
        "object" => {
            let mut children = BTreeMap::new();
            for (name, child) in properties {
                if naming::flag_segment(name).is_empty() {
                    let raw_path = if path.is_empty() {
                        name.to_string()
                    } else {
                        format!("{}.{}", path, name)
                    };
                    return Err(CtlError::unsupported(
                        raw_path,
                        "property name does not yield a flag name",
                    ));
                }
                children.insert(name.to_string(), convert(child, &naming::join(path, name))?);
            }
            SchemaKind::Object {
                properties: children,
                required: source.required_list(),
            }
        }
        "array" => {
            let item = match items {
                Some(item) => convert(item, path)?,
                None => SchemaNode::scalar(ScalarType::String),
            };
            if matches!(item.kind, SchemaKind::Array(_)) {
                return Err(CtlError::unsupported(
                    display_path,
                    "array nested in array is not supported",
                ));
            }
            SchemaKind::Array(Box::new(item))
        }
        other => {
            return Err(CtlError::unsupported(
                display_path,
                format!("type '{}' is not supported", other),
            ))
        }
    };

    let (minimum, maximum) = source.bounds();
    let nullable = source.is_nullable() && !matches!(kind, SchemaKind::Null);
    Ok(SchemaNode {
        kind,
        enum_values: source.enum_list(),
        default: source.default_value(),
        minimum,
        maximum,
        description: source.description_text().to_string(),
        nullable,
    })
}

fn has_kubernetes_extensions(value: &Value) -> bool {
    match value {
        Value::Object(map) => map
            .iter()
            .any(|(k, v)| k.starts_with("x-kubernetes-") || has_kubernetes_extensions(v)),
        Value::Array(items) => items.iter().any(has_kubernetes_extensions),
        _ => false,
    }
}
