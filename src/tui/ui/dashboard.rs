//! Dashboard view: Main overview screen.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::domain::RiskTier;
use crate::tui::styles::CardioTheme;

/// Tally of assessments performed this session.
///
/// Only aggregate counts are kept; individual inputs and results are
/// dropped as soon as the result screen is left.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionSummary {
    pub total: usize,
    pub low: u32,
    pub moderate: u32,
    pub high: u32,
    /// Assessments from a model without probability support.
    pub untiered: u32,
}

impl SessionSummary {
    pub fn record(&mut self, tier: Option<RiskTier>) {
        self.total += 1;
        match tier {
            Some(RiskTier::Low) => self.low += 1,
            Some(RiskTier::Moderate) => self.moderate += 1,
            Some(RiskTier::High) => self.high += 1,
            None => self.untiered += 1,
        }
    }
}

/// Dashboard state for rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardState {
    pub model_loaded: bool,
    /// `None` until artifacts are loaded.
    pub probabilistic: Option<bool>,
    pub session: SessionSummary,
}

/// Render the main dashboard view.
pub fn render_dashboard(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
        ])
        .split(area);

    render_header(f, chunks[0]);
    render_main_content(f, chunks[1], state);
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", CardioTheme::text()),
        Span::styled("Cardioscope", CardioTheme::title()),
        Span::styled(" │ ", CardioTheme::text_muted()),
        Span::styled(
            "Cardiovascular Disease Risk Assessment",
            CardioTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(CardioTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_main_content(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40), // Status panels
            Constraint::Percentage(60), // Session summary
        ])
        .split(area);

    render_status_panels(f, chunks[0], state);
    render_session_summary(f, chunks[1], state.session);
}

fn render_status_panels(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // System status
            Constraint::Min(0),    // Quick actions
        ])
        .margin(1)
        .split(area);

    let capability = match state.probabilistic {
        Some(true) => Line::from(vec![
            Span::styled("  Output: ", CardioTheme::text_secondary()),
            Span::styled("class + probability", CardioTheme::text()),
        ]),
        Some(false) => Line::from(vec![
            Span::styled("  Output: ", CardioTheme::text_secondary()),
            Span::styled("class only", CardioTheme::warning()),
        ]),
        None => Line::from(vec![
            Span::styled("  Output: ", CardioTheme::text_secondary()),
            Span::styled("unavailable", CardioTheme::text_muted()),
        ]),
    };

    let status_items = vec![
        format_status_item("Model Artifacts", state.model_loaded),
        capability,
        Line::from(vec![
            Span::styled("  Assessments: ", CardioTheme::text_secondary()),
            Span::styled(state.session.total.to_string(), CardioTheme::text()),
        ]),
    ];

    let status_block = Block::default()
        .title(Span::styled(" System Status ", CardioTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(CardioTheme::border());

    let status_list = Paragraph::new(status_items).block(status_block);
    f.render_widget(status_list, chunks[0]);

    // Quick Actions
    let actions = vec![
        Line::from(vec![
            Span::styled("[N] ", CardioTheme::key_hint()),
            Span::styled("New Assessment", CardioTheme::key_desc()),
        ]),
        Line::from(vec![
            Span::styled("[Q] ", CardioTheme::key_hint()),
            Span::styled("Quit", CardioTheme::key_desc()),
        ]),
    ];

    let actions_block = Block::default()
        .title(Span::styled(" Quick Actions ", CardioTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(CardioTheme::border());

    let actions_list = Paragraph::new(actions).block(actions_block);
    f.render_widget(actions_list, chunks[1]);
}

fn format_status_item(label: &str, ok: bool) -> Line<'static> {
    let (icon, style) = if ok {
        ("OK", CardioTheme::success())
    } else {
        ("FAIL", CardioTheme::danger())
    };

    Line::from(vec![
        Span::styled(format!("  {icon} "), style),
        Span::styled(label.to_string(), CardioTheme::text()),
    ])
}

fn render_session_summary(f: &mut Frame, area: Rect, session: SessionSummary) {
    let block = Block::default()
        .title(Span::styled(" This Session ", CardioTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(CardioTheme::border());

    if session.total == 0 {
        let empty_msg = Paragraph::new(Line::from(vec![Span::styled(
            "No assessments yet. Press [N] to start.",
            CardioTheme::text_muted(),
        )]))
        .block(block);
        f.render_widget(empty_msg, area);
        return;
    }

    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Assessments: ", CardioTheme::text_secondary()),
            Span::styled(session.total.to_string(), CardioTheme::text()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Low: ", CardioTheme::text_secondary()),
            Span::styled(
                session.low.to_string(),
                CardioTheme::risk_tier(RiskTier::Low),
            ),
            Span::styled("  ", CardioTheme::text()),
            Span::styled("Moderate: ", CardioTheme::text_secondary()),
            Span::styled(
                session.moderate.to_string(),
                CardioTheme::risk_tier(RiskTier::Moderate),
            ),
            Span::styled("  ", CardioTheme::text()),
            Span::styled("High: ", CardioTheme::text_secondary()),
            Span::styled(
                session.high.to_string(),
                CardioTheme::risk_tier(RiskTier::High),
            ),
        ]),
    ];

    if session.untiered > 0 {
        lines.push(Line::from(vec![
            Span::styled("Class only: ", CardioTheme::text_secondary()),
            Span::styled(session.untiered.to_string(), CardioTheme::info()),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![Span::styled(
        "Patient details are not retained between assessments.",
        CardioTheme::text_muted(),
    )]));

    let p = Paragraph::new(lines).block(Block::default());
    f.render_widget(p, inner);
}
