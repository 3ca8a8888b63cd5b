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

//! Parameter schema model and normalization

pub mod adapter;
pub mod model;
pub mod naming;

pub use self::adapter::{load_file, normalize, OpenApiSchema, ParametersSchema};
pub use self::model::{CanonicalSchema, ScalarType, SchemaKind, SchemaNode, ValueMap};
pub use self::naming::flag_name;
