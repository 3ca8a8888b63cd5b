//! Color theme for CLI output

use comfy_table::Color as TableColor;

/// Color theme for terminal output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub success: TableColor,
    pub warning: TableColor,
    pub error: TableColor,
    pub info: TableColor,
    pub muted: TableColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            success: TableColor::Green,
            warning: TableColor::Yellow,
            error: TableColor::Red,
            info: TableColor::Cyan,
            muted: TableColor::DarkGrey,
        }
    }
}

impl ColorTheme {
    /// Get color for a BackupRepo phase
    pub fn get_phase_color(&self, phase: &str) -> TableColor {
        match phase {
            "Ready" => self.success,
            "Failed" => self.error,
            "PreChecking" | "Deleting" => self.warning,
            _ => self.muted,
        }
    }
}
