//! Color palette and styles for the dashboard.
//!
//! Colors chosen for:
//! - Professional healthcare appearance
//! - High contrast for accessibility

use ratatui::style::{Color, Modifier, Style};

use crate::domain::{RiskTier, Severity};

/// Cardio theme color palette.
pub struct CardioTheme;

impl CardioTheme {
    // === Primary Colors ===

    /// Deep teal - Primary color
    pub const PRIMARY: Color = Color::Rgb(13, 148, 136); // #0D9488

    /// Lighter teal for highlights
    pub const PRIMARY_LIGHT: Color = Color::Rgb(45, 212, 191); // #2DD4BF

    // === Secondary Colors ===

    /// Light slate for borders
    pub const SECONDARY_LIGHT: Color = Color::Rgb(148, 163, 184); // #94A3B8

    // === Semantic Colors ===

    /// Emerald - Success/healthy
    pub const SUCCESS: Color = Color::Rgb(16, 185, 129); // #10B981

    /// Amber - Warning/moderate risk
    pub const WARNING: Color = Color::Rgb(251, 191, 36); // #FBBF24

    /// Rose - Error/high risk
    pub const DANGER: Color = Color::Rgb(244, 63, 94); // #F43F5E

    /// Blue - Info
    pub const INFO: Color = Color::Rgb(59, 130, 246); // #3B82F6

    // === Text Colors ===

    /// Primary text (white)
    pub const TEXT_PRIMARY: Color = Color::Rgb(248, 250, 252); // #F8FAFC

    /// Secondary text (gray)
    pub const TEXT_SECONDARY: Color = Color::Rgb(148, 163, 184); // #94A3B8

    /// Muted text
    pub const TEXT_MUTED: Color = Color::Rgb(100, 116, 139); // #64748B

    // === Preset Styles ===

    /// Style for titles
    #[must_use]
    pub fn title() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for subtitles
    #[must_use]
    pub fn subtitle() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for normal text
    #[must_use]
    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    /// Style for secondary text
    #[must_use]
    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Style for muted text
    #[must_use]
    pub fn text_muted() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    /// Style for success messages
    #[must_use]
    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    /// Style for warning messages
    #[must_use]
    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    /// Style for danger/error messages
    #[must_use]
    pub fn danger() -> Style {
        Style::default().fg(Self::DANGER)
    }

    /// Style for info messages
    #[must_use]
    pub fn info() -> Style {
        Style::default().fg(Self::INFO)
    }

    /// Style for focused elements
    #[must_use]
    pub fn focused() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for borders
    #[must_use]
    pub fn border() -> Style {
        Style::default().fg(Self::SECONDARY_LIGHT)
    }

    /// Style for focused borders
    #[must_use]
    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    /// Style for key hints
    #[must_use]
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for key descriptions
    #[must_use]
    pub fn key_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Get risk tier style
    #[must_use]
    pub fn risk_tier(tier: RiskTier) -> Style {
        match tier {
            RiskTier::Low => Self::success(),
            RiskTier::Moderate => Self::warning(),
            RiskTier::High => Self::danger(),
        }
    }

    /// Get recommendation severity style
    #[must_use]
    pub fn severity(severity: Severity) -> Style {
        match severity {
            Severity::Good => Self::success(),
            Severity::Info => Self::info(),
            Severity::Caution => Self::warning(),
            Severity::Alert => Self::danger(),
        }
    }

    /// Get gauge style based on risk probability (0-1).
    #[must_use]
    pub fn risk_gauge(probability: f64) -> Style {
        if probability < 0.30 {
            Self::success()
        } else if probability < 0.60 {
            Self::warning()
        } else {
            Self::danger()
        }
    }
}
