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

//! Representation-agnostic schema tree shared by flag synthesis, collection
//! and validation.

use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Nested values reconstructed from flags, shaped like the schema tree.
pub type ValueMap = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ScalarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Integer => "integer",
            ScalarType::Number => "number",
            ScalarType::Boolean => "boolean",
        }
    }

    pub fn zero_value(&self) -> Value {
        match self {
            ScalarType::String => Value::String(String::new()),
            ScalarType::Integer => Value::from(0i64),
            ScalarType::Number => Number::from_f64(0.0).map_or(Value::Null, Value::Number),
            ScalarType::Boolean => Value::Bool(false),
        }
    }

    /// Cast a literal to this type. Returns `None` when the literal has no
    /// sensible representation in the type.
    pub fn cast(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (ScalarType::String, Value::String(s)) => Some(Value::String(s.clone())),
            (ScalarType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (ScalarType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

            (ScalarType::Integer, Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(Value::from),
            (ScalarType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
            (ScalarType::Integer, Value::Bool(b)) => Some(Value::from(*b as i64)),

            (ScalarType::Number, Value::Number(n)) => {
                n.as_f64().and_then(Number::from_f64).map(Value::Number)
            }
            (ScalarType::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            (ScalarType::Number, Value::Bool(b)) => {
                Number::from_f64(if *b { 1.0 } else { 0.0 }).map(Value::Number)
            }

            (ScalarType::Boolean, Value::Bool(b)) => Some(Value::Bool(*b)),
            (ScalarType::Boolean, Value::String(s)) => match s.trim() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            (ScalarType::Boolean, Value::Number(n)) => n.as_f64().map(|f| Value::Bool(f != 0.0)),

            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Null,
    Scalar(ScalarType),
    Object {
        properties: BTreeMap<String, SchemaNode>,
        required: Vec<String>,
    },
    Array(Box<SchemaNode>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub enum_values: Vec<Value>,
    pub default: Option<Value>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub description: String,
    /// `null` is accepted alongside the declared type.
    pub nullable: bool,
}

impl SchemaNode {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            enum_values: Vec::new(),
            default: None,
            minimum: None,
            maximum: None,
            description: String::new(),
            nullable: false,
        }
    }

    pub fn scalar(scalar: ScalarType) -> Self {
        Self::new(SchemaKind::Scalar(scalar))
    }

    pub fn object(properties: BTreeMap<String, SchemaNode>, required: Vec<String>) -> Self {
        Self::new(SchemaKind::Object {
            properties,
            required,
        })
    }

    pub fn array(items: SchemaNode) -> Self {
        Self::new(SchemaKind::Array(Box::new(items)))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_values = values;
        self
    }

    pub fn with_range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self.kind {
            SchemaKind::Scalar(t) => Some(t),
            _ => None,
        }
    }

    pub fn properties(&self) -> Option<&BTreeMap<String, SchemaNode>> {
        match &self.kind {
            SchemaKind::Object { properties, .. } => Some(properties),
            _ => None,
        }
    }

    /// The declared default cast to this node's scalar type.
    ///
    /// A default that cannot be cast yields the type's zero value.
    pub fn typed_default(&self) -> Option<Value> {
        let scalar = self.scalar_type()?;
        let raw = self.default.as_ref()?;
        Some(scalar.cast(raw).unwrap_or_else(|| {
            tracing::debug!(
                "default {} is not a valid {}, using zero value",
                raw,
                scalar.as_str()
            );
            scalar.zero_value()
        }))
    }

    /// Re-emit this node as a JSON Schema document. With `with_required`
    /// unset, `required` lists are dropped so partial value maps validate.
    pub fn to_json_schema(&self, with_required: bool) -> Value {
        let mut out = Map::new();
        match &self.kind {
            SchemaKind::Null => {
                out.insert("type".into(), Value::from("null"));
            }
            SchemaKind::Scalar(t) => {
                out.insert("type".into(), self.type_keyword(t.as_str()));
            }
            SchemaKind::Object {
                properties,
                required,
            } => {
                out.insert("type".into(), self.type_keyword("object"));
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_schema(with_required)))
                    .collect();
                out.insert("properties".into(), Value::Object(props));
                if with_required && !required.is_empty() {
                    out.insert("required".into(), Value::from(required.clone()));
                }
            }
            SchemaKind::Array(items) => {
                out.insert("type".into(), self.type_keyword("array"));
                out.insert("items".into(), items.to_json_schema(with_required));
            }
        }
        if !self.enum_values.is_empty() {
            let mut legal = self.enum_values.clone();
            if self.nullable && !legal.contains(&Value::Null) {
                legal.push(Value::Null);
            }
            out.insert("enum".into(), Value::Array(legal));
        }
        if let Some(min) = self.minimum.and_then(Number::from_f64) {
            out.insert("minimum".into(), Value::Number(min));
        }
        if let Some(max) = self.maximum.and_then(Number::from_f64) {
            out.insert("maximum".into(), Value::Number(max));
        }
        Value::Object(out)
    }

    fn type_keyword(&self, name: &str) -> Value {
        if self.nullable {
            Value::from(vec![name, "null"])
        } else {
            Value::from(name)
        }
    }

    fn defaults(&self) -> Option<Value> {
        match &self.kind {
            SchemaKind::Null => None,
            SchemaKind::Scalar(_) => self.typed_default(),
            SchemaKind::Object { properties, .. } => {
                let map: ValueMap = properties
                    .iter()
                    .filter_map(|(k, v)| v.defaults().map(|d| (k.clone(), d)))
                    .collect();
                (!map.is_empty()).then_some(Value::Object(map))
            }
            SchemaKind::Array(_) => self.default.clone(),
        }
    }
}

/// Root of a normalized parameter schema.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSchema {
    pub root: SchemaNode,
    /// Top-level properties routed to the credential sink.
    pub credential_fields: Vec<String>,
}

impl CanonicalSchema {
    pub fn new(properties: BTreeMap<String, SchemaNode>, required: Vec<String>) -> Self {
        Self {
            root: SchemaNode::object(properties, required),
            credential_fields: Vec::new(),
        }
    }

    pub fn with_credential_fields(mut self, fields: Vec<String>) -> Self {
        self.credential_fields = fields;
        self
    }

    pub fn properties(&self) -> &BTreeMap<String, SchemaNode> {
        static EMPTY: BTreeMap<String, SchemaNode> = BTreeMap::new();
        self.root.properties().unwrap_or(&EMPTY)
    }

    pub fn required(&self) -> &[String] {
        match &self.root.kind {
            SchemaKind::Object { required, .. } => required,
            _ => &[],
        }
    }

    pub fn is_credential(&self, name: &str) -> bool {
        self.credential_fields.iter().any(|f| f == name)
    }

    /// Value map built directly from the declared defaults.
    pub fn defaults(&self) -> ValueMap {
        match self.root.defaults() {
            Some(Value::Object(map)) => map,
            _ => ValueMap::new(),
        }
    }
}
