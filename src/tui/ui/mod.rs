//! UI module: View components for the TUI.

pub mod dashboard;
pub mod patient;
pub mod result;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::CardioTheme;

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(vec![Span::styled(
            "DISCLAIMER: This tool provides indicative estimates and does not replace professional medical evaluation.",
            CardioTheme::text_muted(),
        )]),
        Line::from(vec![Span::styled(
            "Always consult a physician for diagnosis and treatment decisions.",
            CardioTheme::text_muted(),
        )]),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(CardioTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
