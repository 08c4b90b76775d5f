//! Assessment result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::domain::Assessment;
use crate::tui::styles::CardioTheme;

/// Result screen state
#[derive(Debug, Clone, Default)]
pub enum ResultState {
    /// Not started
    #[default]
    Idle,
    /// Completed with result
    Complete { assessment: Assessment },
    /// Error occurred
    Error { message: String },
}

/// Render the assessment result screen
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_result_header(f, chunks[0]);
    match state {
        ResultState::Idle => render_idle(f, chunks[1]),
        ResultState::Complete { assessment } => render_assessment(f, chunks[1], assessment),
        ResultState::Error { message } => render_error(f, chunks[1], message),
    }
    render_result_footer(f, chunks[2], state);
}

fn render_result_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", CardioTheme::text()),
        Span::styled("Assessment Result", CardioTheme::title()),
        Span::styled(" │ Risk Estimate & Advice", CardioTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(CardioTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "No assessment yet",
            CardioTheme::text_secondary(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Enter patient data to begin",
            CardioTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(CardioTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_assessment(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let block = Block::default()
        .title(Span::styled(" Risk Assessment ", CardioTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(CardioTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Tier banner
            Constraint::Length(3), // Probability gauge
            Constraint::Min(0),    // Recommendations
        ])
        .margin(1)
        .split(inner);

    render_tier_banner(f, chunks[0], assessment);
    render_probability(f, chunks[1], assessment);
    render_recommendations(f, chunks[2], assessment);
}

fn render_tier_banner(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let lines = match assessment.risk_tier {
        Some(tier) => {
            let style = CardioTheme::risk_tier(tier);
            vec![
                Line::from(Span::styled(
                    format!("{tier} RISK"),
                    style.add_modifier(ratatui::style::Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    tier.description(),
                    CardioTheme::text_secondary(),
                )),
            ]
        }
        None => {
            let class_text = if assessment.prediction.predicted_class == 1 {
                "Predicted: cardiovascular disease indicated"
            } else {
                "Predicted: no cardiovascular disease indicated"
            };
            vec![
                Line::from(Span::styled(class_text, CardioTheme::text())),
                Line::from(Span::styled(
                    "This model does not report a probability.",
                    CardioTheme::text_muted(),
                )),
            ]
        }
    };

    let banner = Paragraph::new(lines).alignment(Alignment::Center);
    f.render_widget(banner, area);
}

fn render_probability(f: &mut Frame, area: Rect, assessment: &Assessment) {
    match assessment.prediction.probability() {
        Some(p) => {
            let gauge = Gauge::default()
                .block(
                    Block::default()
                        .title(Span::styled(
                            " Disease Probability ",
                            CardioTheme::text_secondary(),
                        ))
                        .borders(Borders::ALL)
                        .border_style(CardioTheme::border()),
                )
                .gauge_style(CardioTheme::risk_gauge(p))
                .percent((p * 100.0) as u16)
                .label(format!(
                    "{:.1}%",
                    assessment.prediction.probability_percent.unwrap_or(0.0)
                ));
            f.render_widget(gauge, area);
        }
        None => {
            let note = Paragraph::new(Line::from(Span::styled(
                "Probability: not available",
                CardioTheme::text_muted(),
            )))
            .alignment(Alignment::Center);
            f.render_widget(note, area);
        }
    }
}

fn render_recommendations(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let mut lines = Vec::with_capacity(assessment.recommendations.len());
    for rec in &assessment.recommendations {
        lines.push(Line::from(vec![
            Span::styled("• ", CardioTheme::severity(rec.severity)),
            Span::styled(rec.text.clone(), CardioTheme::text()),
        ]));
    }

    let block = Block::default()
        .title(Span::styled(" Recommendations ", CardioTheme::subtitle()))
        .borders(Borders::TOP)
        .border_style(CardioTheme::border());

    let p = Paragraph::new(lines).block(block);
    f.render_widget(p, area);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Error", CardioTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, CardioTheme::text())),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(CardioTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_result_footer(f: &mut Frame, area: Rect, state: &ResultState) {
    let content = match state {
        ResultState::Complete { .. } => Line::from(vec![
            Span::styled("[Enter] ", CardioTheme::key_hint()),
            Span::styled("Return ", CardioTheme::key_desc()),
            Span::styled("[N] ", CardioTheme::key_hint()),
            Span::styled("New Assessment", CardioTheme::key_desc()),
        ]),
        ResultState::Error { .. } => Line::from(vec![
            Span::styled("[Enter] ", CardioTheme::key_hint()),
            Span::styled("Back to Form ", CardioTheme::key_desc()),
            Span::styled("[Esc] ", CardioTheme::key_hint()),
            Span::styled("Dashboard", CardioTheme::key_desc()),
        ]),
        ResultState::Idle => Line::from(vec![Span::styled(
            "Waiting for input...",
            CardioTheme::text_muted(),
        )]),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(CardioTheme::border()),
    );

    f.render_widget(footer, area);
}
