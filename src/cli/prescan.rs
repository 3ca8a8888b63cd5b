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

//! Argument peek ahead of strict parsing.
//!
//! Schema flags only exist once the schema is known, and the schema depends on
//! arguments clap has not parsed yet (the provider, the repository, or the
//! schema files). The prescan walks argv once, collects the global options
//! and works out which schema the strict parse will need.

use std::path::PathBuf;

/// Where the schema for the invoked command comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DynamicTarget {
    /// `backup-repo create --provider P`
    Provider(String),
    /// `backup-repo update NAME`: the provider is read from the repository.
    Repo(String),
    /// `schema <cmd> --file F...`
    Files(Vec<PathBuf>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prescan {
    pub namespace: Option<String>,
    pub kubeconfig: Option<String>,
    pub context: Option<String>,
    pub config_file: Option<PathBuf>,
    /// Subcommand path, e.g. `["backup-repo", "create"]`.
    pub path: Vec<String>,
    pub target: Option<DynamicTarget>,
}

const GLOBAL_VALUE_OPTIONS: &[(&str, Option<char>)] = &[
    ("namespace", Some('n')),
    ("kubeconfig", None),
    ("context", None),
    ("config-file", None),
];

/// Static options of the dynamic subcommands that take a value.
const STATIC_VALUE_OPTIONS: &[(&str, Option<char>)] = &[
    ("provider", None),
    ("access-method", None),
    ("pv-reclaim-policy", None),
    ("volume-capacity", None),
    ("file", Some('f')),
    ("values", None),
];

/// A recognised option token, with the value when it was attached.
struct OptionToken<'a> {
    name: &'a str,
    inline: Option<&'a str>,
}

fn match_option<'a>(token: &'a str, table: &[(&'static str, Option<char>)]) -> Option<OptionToken<'a>> {
    if let Some(long) = token.strip_prefix("--") {
        let (name, inline) = match long.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (long, None),
        };
        return table
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(n, _)| OptionToken { name: n, inline });
    }
    let short = token.strip_prefix('-')?;
    let mut chars = short.chars();
    let first = chars.next()?;
    let rest = chars.as_str();
    table
        .iter()
        .find(|(_, s)| *s == Some(first))
        .map(|(n, _)| OptionToken {
            name: n,
            inline: (!rest.is_empty()).then(|| rest.trim_start_matches('=')),
        })
}

impl Prescan {
    pub fn scan<S: AsRef<str>>(argv: &[S]) -> Self {
        let args: Vec<&str> = argv.iter().skip(1).map(AsRef::as_ref).collect();
        let mut scan = Prescan::default();
        let mut provider = None;
        let mut repo = None;
        let mut files = Vec::new();
        let mut positional_closed = false;

        let mut i = 0;
        while i < args.len() {
            let token = args[i];
            i += 1;
            if token == "--" {
                break;
            }

            if let Some(opt) = match_option(token, GLOBAL_VALUE_OPTIONS) {
                let value = opt.inline.map(str::to_string).or_else(|| {
                    let v = args.get(i).map(|v| v.to_string());
                    i += 1;
                    v
                });
                match opt.name {
                    "namespace" => scan.namespace = value,
                    "kubeconfig" => scan.kubeconfig = value,
                    "context" => scan.context = value,
                    _ => scan.config_file = value.map(PathBuf::from),
                }
                continue;
            }

            if scan.path.len() >= 2 {
                if let Some(opt) = match_option(token, STATIC_VALUE_OPTIONS) {
                    let value = opt.inline.map(str::to_string).or_else(|| {
                        let v = args.get(i).map(|v| v.to_string());
                        i += 1;
                        v
                    });
                    match (opt.name, value) {
                        ("provider", Some(v)) => provider = Some(v),
                        ("file", Some(v)) => files.push(PathBuf::from(v)),
                        _ => {}
                    }
                    continue;
                }
            }

            if token.starts_with('-') {
                // Unknown options may be schema flags whose values look like
                // positionals; the repository name must come before them.
                if scan.path.len() >= 2 && token != "--default" && !token.starts_with("--default=") {
                    positional_closed = true;
                }
                continue;
            }

            if scan.path.len() < 2 {
                scan.path.push(token.to_string());
            } else if repo.is_none() && !positional_closed {
                repo = Some(token.to_string());
            }
        }

        let path: Vec<&str> = scan.path.iter().map(String::as_str).collect();
        scan.target = match path.as_slice() {
            ["backup-repo", "create"] => provider.map(DynamicTarget::Provider),
            ["backup-repo", "update"] => repo.map(DynamicTarget::Repo),
            ["schema", _] if !files.is_empty() => Some(DynamicTarget::Files(files)),
            _ => None,
        };
        scan
    }

    pub fn is_help_request<S: AsRef<str>>(argv: &[S]) -> bool {
        argv.iter()
            .skip(1)
            .take_while(|a| a.as_ref() != "--")
            .any(|a| matches!(a.as_ref(), "-h" | "--help"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_provider() {
        let scan = Prescan::scan(&["dbctl", "-n", "backup", "backup-repo", "create", "--provider", "s3", "--bucket", "b"]);
        assert_eq!(scan.namespace.as_deref(), Some("backup"));
        assert_eq!(scan.path, vec!["backup-repo", "create"]);
        assert_eq!(scan.target, Some(DynamicTarget::Provider("s3".to_string())));

        let scan = Prescan::scan(&["dbctl", "backup-repo", "create", "my-repo", "--provider=minio"]);
        assert_eq!(scan.target, Some(DynamicTarget::Provider("minio".to_string())));
    }

    #[test]
    fn test_update_repo_name() {
        let scan = Prescan::scan(&["dbctl", "backup-repo", "update", "my-repo", "--bucket", "other"]);
        assert_eq!(scan.target, Some(DynamicTarget::Repo("my-repo".to_string())));

        let scan = Prescan::scan(&["dbctl", "backup-repo", "update", "--context", "prod", "my-repo"]);
        assert_eq!(scan.context.as_deref(), Some("prod"));
        assert_eq!(scan.target, Some(DynamicTarget::Repo("my-repo".to_string())));

        let scan = Prescan::scan(&["dbctl", "backup-repo", "update", "--bucket", "other", "my-repo"]);
        assert_eq!(scan.target, None);
    }

    #[test]
    fn test_schema_files() {
        let scan = Prescan::scan(&["dbctl", "schema", "flags", "-f", "a.yaml", "--file=b.json"]);
        assert_eq!(
            scan.target,
            Some(DynamicTarget::Files(vec![
                PathBuf::from("a.yaml"),
                PathBuf::from("b.json")
            ]))
        );
    }

    #[test]
    fn test_static_commands_have_no_target() {
        let scan = Prescan::scan(&["dbctl", "--kubeconfig=/tmp/kc", "backup-repo", "list"]);
        assert_eq!(scan.kubeconfig.as_deref(), Some("/tmp/kc"));
        assert_eq!(scan.target, None);

        assert_eq!(Prescan::scan(&["dbctl"]).target, None);
    }

    #[test]
    fn test_help_request() {
        assert!(Prescan::is_help_request(&["dbctl", "backup-repo", "--help"]));
        assert!(!Prescan::is_help_request(&["dbctl", "schema", "validate", "--", "-h"]));
    }
}
