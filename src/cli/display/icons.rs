//! Status icons for CLI output

/// Status icons for different states
pub struct StatusIcon;

impl StatusIcon {
    /// Success icon (repository ready)
    pub const SUCCESS: &'static str = "✓";

    /// Warning icon (checking or deleting)
    pub const WARNING: &'static str = "⚠";

    /// Error icon (failed)
    pub const ERROR: &'static str = "✗";

    /// Unknown icon
    pub const UNKNOWN: &'static str = "?";

    /// Default repository marker
    pub const DEFAULT: &'static str = "★";

    /// Get status icon for a BackupRepo phase
    pub fn get_phase_icon(phase: &str) -> &'static str {
        match phase {
            "Ready" => Self::SUCCESS,
            "Failed" => Self::ERROR,
            "PreChecking" | "Deleting" => Self::WARNING,
            _ => Self::UNKNOWN,
        }
    }
}
