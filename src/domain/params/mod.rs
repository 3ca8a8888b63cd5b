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

//! Schema-driven command-line parameters: synthesize flags, collect them
//! back into nested values, validate the result.

pub mod collector;
pub mod registry;
pub mod synthesizer;
pub mod validator;

pub use collector::{collect, stringify_value, CollectMode, CollectedParams};
pub use registry::{FlagRegistry, FlagSpec};
pub use synthesizer::Synthesizer;
pub use validator::{validate, validate_partial, ValidationError, ValidationErrors};
