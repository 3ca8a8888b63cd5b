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

//! Flag naming: kebab-cased path segments joined with `.`

use heck::ToKebabCase;

pub fn flag_segment(property: &str) -> String {
    property.to_kebab_case()
}

/// Extend a dotted flag prefix with one more schema property.
pub fn join(prefix: &str, property: &str) -> String {
    if prefix.is_empty() {
        flag_segment(property)
    } else {
        format!("{}.{}", prefix, flag_segment(property))
    }
}

pub fn flag_name<S: AsRef<str>>(path: &[S]) -> String {
    path.iter()
        .fold(String::new(), |acc, segment| join(&acc, segment.as_ref()))
}
