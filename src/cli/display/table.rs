//! Table rendering for CLI output

use super::{ColorTheme, StatusIcon};
use crate::domain::backup_repo::BackupRepo;
use crate::domain::params::FlagRegistry;
use chrono::{DateTime, Utc};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Color, ContentArrangement, Table};

/// Table renderer for formatted output
pub struct TableRenderer {
    theme: ColorTheme,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    /// Create a new table renderer with default theme
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
        }
    }

    /// Render backup repositories as a formatted table
    pub fn render_repos_list(&self, repos: &[BackupRepo]) -> String {
        if repos.is_empty() {
            return "No backup repositories found".to_string();
        }

        let now = Utc::now();
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("NAME").set_alignment(CellAlignment::Left),
                Cell::new("PROVIDER").set_alignment(CellAlignment::Left),
                Cell::new("STATUS").set_alignment(CellAlignment::Center),
                Cell::new("ACCESS METHOD").set_alignment(CellAlignment::Left),
                Cell::new("DEFAULT").set_alignment(CellAlignment::Center),
                Cell::new("AGE").set_alignment(CellAlignment::Right),
            ]);

        for repo in repos {
            let icon = StatusIcon::get_phase_icon(&repo.phase);
            let color = self.theme.get_phase_color(&repo.phase);
            table.add_row(vec![
                Cell::new(&repo.name),
                Cell::new(&repo.provider),
                Cell::new(format!("{} {}", icon, repo.phase)).fg(color),
                Cell::new(&repo.access_method),
                Cell::new(if repo.is_default { StatusIcon::DEFAULT } else { "" })
                    .fg(self.theme.info),
                Cell::new(format_age(repo.created, now)),
            ]);
        }

        let mut output = String::new();
        output.push_str(&format!(
            "╭─ Backup Repositories {} ─╮\n",
            format!("[{} repos]", repos.len()).bright_black()
        ));
        output.push_str(&table.to_string());
        output.push('\n');
        output.push_str(&format!(
            "Legend: {} Ready  {} Checking  {} Failed  {} Default\n",
            StatusIcon::SUCCESS.green(),
            StatusIcon::WARNING.yellow(),
            StatusIcon::ERROR.red(),
            StatusIcon::DEFAULT.cyan()
        ));

        output
    }

    /// Render a single repository. Credential values are never shown, only
    /// the key names stored in the secret.
    pub fn render_repo_detail(&self, repo: &BackupRepo, credential_keys: &[String]) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        let phase = format!("{} {}", StatusIcon::get_phase_icon(&repo.phase), repo.phase);
        let rows: Vec<(&str, Cell)> = vec![
            ("Name", Cell::new(&repo.name)),
            ("Provider", Cell::new(&repo.provider)),
            (
                "Status",
                Cell::new(phase).fg(self.theme.get_phase_color(&repo.phase)),
            ),
            ("Access Method", Cell::new(&repo.access_method)),
            ("PV Reclaim Policy", Cell::new(&repo.pv_reclaim_policy)),
            (
                "Volume Capacity",
                Cell::new(repo.volume_capacity.as_deref().unwrap_or("-")),
            ),
            (
                "Default",
                Cell::new(if repo.is_default { "true" } else { "false" }),
            ),
            (
                "Created",
                Cell::new(
                    repo.created
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ),
            ),
        ];
        for (label, value) in rows {
            table.add_row(vec![Cell::new(label).fg(Color::Cyan), value]);
        }

        for (key, value) in &repo.config {
            table.add_row(vec![
                Cell::new(format!("config.{}", key)).fg(Color::Cyan),
                Cell::new(value),
            ]);
        }

        if let Some(secret) = &repo.credential {
            table.add_row(vec![
                Cell::new("Credential").fg(Color::Cyan),
                Cell::new(format!("{}/{}", secret.namespace, secret.name)),
            ]);
            for key in credential_keys {
                table.add_row(vec![
                    Cell::new(format!("credential.{}", key)).fg(Color::Cyan),
                    Cell::new("<redacted>").fg(self.theme.muted),
                ]);
            }
        }

        table.to_string()
    }

    /// Render the flags synthesized from a schema
    pub fn render_flags(&self, registry: &FlagRegistry) -> String {
        if registry.is_empty() {
            return "Schema declares no parameters".to_string();
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("FLAG").set_alignment(CellAlignment::Left),
                Cell::new("TYPE").set_alignment(CellAlignment::Left),
                Cell::new("REQUIRED").set_alignment(CellAlignment::Center),
                Cell::new("DEFAULT").set_alignment(CellAlignment::Left),
                Cell::new("DESCRIPTION").set_alignment(CellAlignment::Left),
            ]);

        for spec in registry.iter() {
            let default = match &spec.default {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(v) => v.to_string(),
                None => String::new(),
            };
            table.add_row(vec![
                Cell::new(format!("--{}", spec.name)),
                Cell::new(spec.type_label()),
                Cell::new(if spec.required { StatusIcon::SUCCESS } else { "" })
                    .fg(self.theme.warning),
                Cell::new(default),
                Cell::new(&spec.help),
            ]);
        }

        format!(
            "{}\n{}",
            format!("{} flags", registry.len()).bright_black(),
            table
        )
    }
}

/// Compact age such as `3d`, `5h`, `12m` or `40s`.
pub fn format_age(created: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(created) = created else {
        return "-".to_string();
    };
    let secs = (now - created).num_seconds().max(0);
    match secs {
        s if s >= 86_400 => format!("{}d", s / 86_400),
        s if s >= 3_600 => format!("{}h", s / 3_600),
        s if s >= 60 => format!("{}m", s / 60),
        s => format!("{}s", s),
    }
}
