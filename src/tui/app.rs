//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Service integration

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::application::InferenceService;
use crate::CardioscopeError;

use super::ui::{
    dashboard::{render_dashboard, DashboardState},
    patient::{render_patient_form, PatientFormState},
    render_disclaimer,
    result::{render_result, ResultState},
};

/// Current screen/view in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    PatientForm,
    Result,
}

/// Main application state
pub struct App {
    /// Current screen
    screen: Screen,

    /// Whether the app should quit
    should_quit: bool,

    /// Inference service, shared with other front-ends
    service: Arc<InferenceService>,

    /// Dashboard state
    dashboard_state: DashboardState,

    /// Patient form state
    patient_form_state: PatientFormState,

    /// Result screen state
    result_state: ResultState,
}

impl App {
    /// Create a new application instance, loading artifacts from the
    /// configured model directory.
    ///
    /// A failed load does not abort startup: the service marks itself
    /// unavailable and every assessment fails with a structured error.
    #[must_use]
    pub fn new() -> Self {
        let model_dir =
            std::env::var("CARDIOSCOPE_MODEL_DIR").unwrap_or_else(|_| "models".to_string());
        let service = Arc::new(InferenceService::load(std::path::Path::new(&model_dir)));
        Self::with_service(service)
    }

    /// Create application with an injected service (Composition Root
    /// pattern). Used by `main.rs` and tests.
    #[must_use]
    pub fn with_service(service: Arc<InferenceService>) -> Self {
        let dashboard_state = DashboardState {
            model_loaded: service.is_available(),
            probabilistic: service.is_probabilistic(),
            ..Default::default()
        };
        Self {
            screen: Screen::Dashboard,
            should_quit: false,
            service,
            dashboard_state,
            patient_form_state: PatientFormState::default(),
            result_state: ResultState::Idle,
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Main loop
        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            // Draw current screen
            terminal.draw(|f| {
                let area = f.area();
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(area);

                let content_area = chunks[0];
                let disclaimer_area = chunks[1];

                match self.screen {
                    Screen::Dashboard => render_dashboard(f, content_area, &self.dashboard_state),
                    Screen::PatientForm => {
                        render_patient_form(f, content_area, &self.patient_form_state)
                    }
                    Screen::Result => render_result(f, content_area, &self.result_state),
                }

                render_disclaimer(f, disclaimer_area);
            })?;

            // Handle input (short poll to stay responsive)
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.modifiers);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::PatientForm => self.handle_patient_form_key(key),
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.patient_form_state = PatientFormState::default();
                self.screen = Screen::PatientForm;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn handle_patient_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.screen = Screen::Dashboard;
            }
            KeyCode::Up => {
                self.patient_form_state.prev_field();
            }
            KeyCode::Down | KeyCode::Tab => {
                self.patient_form_state.next_field();
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.patient_form_state.load_sample_data();
            }
            KeyCode::Char(c) => {
                self.patient_form_state.input_char(c);
            }
            KeyCode::Backspace => {
                self.patient_form_state.delete_char();
            }
            KeyCode::Delete => {
                self.patient_form_state.clear_field();
            }
            KeyCode::Enter => {
                self.submit_patient_form();
            }
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        match &self.result_state {
            ResultState::Complete { .. } => match key {
                KeyCode::Enter | KeyCode::Esc => {
                    self.result_state = ResultState::Idle;
                    self.screen = Screen::Dashboard;
                }
                KeyCode::Char('n') | KeyCode::Char('N') => {
                    self.result_state = ResultState::Idle;
                    self.patient_form_state = PatientFormState::default();
                    self.screen = Screen::PatientForm;
                }
                _ => {}
            },
            ResultState::Error { .. } => match key {
                KeyCode::Enter => {
                    self.screen = Screen::PatientForm;
                }
                KeyCode::Esc => {
                    self.screen = Screen::Dashboard;
                }
                _ => {}
            },
            ResultState::Idle => {}
        }
    }

    fn submit_patient_form(&mut self) {
        let input = match self.patient_form_state.to_patient_input() {
            Ok(input) => input,
            Err(e) => {
                self.patient_form_state.error_message = Some(e);
                return;
            }
        };

        match self.service.assess(&input) {
            Ok(assessment) => {
                self.dashboard_state.session.record(assessment.risk_tier);
                self.result_state = ResultState::Complete { assessment };
                self.screen = Screen::Result;
            }
            // Field-level problems stay on the form; everything else moves
            // to the result screen as a terminal error.
            Err(CardioscopeError::Validation(message)) => {
                self.patient_form_state.error_message = Some(message);
            }
            Err(e) => {
                self.result_state = ResultState::Error {
                    message: e.to_string(),
                };
                self.screen = Screen::Result;
            }
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::adapters::artifact::{LinearModel, StandardScaler};
    use crate::domain::{RiskTier, FEATURE_COUNT};
    use crate::ports::ModelHandle;

    fn test_app() -> App {
        // z = (ap_hi - 120) / 10 against the identity scaler.
        let mut coef = vec![0.0; FEATURE_COUNT];
        coef[3] = 0.1;
        let model = LinearModel::new(coef, -12.0);
        let service = Arc::new(InferenceService::from_parts(
            ModelHandle::Probabilistic(Box::new(model)),
            Box::new(StandardScaler::identity()),
        ));
        App::with_service(service)
    }

    #[test]
    fn test_dashboard_reflects_service_state() {
        let app = test_app();
        assert!(app.dashboard_state.model_loaded);
        assert_eq!(app.dashboard_state.probabilistic, Some(true));

        let empty = App::with_service(Arc::new(InferenceService::unavailable()));
        assert!(!empty.dashboard_state.model_loaded);
        assert_eq!(empty.dashboard_state.probabilistic, None);
    }

    #[test]
    fn test_submit_empty_form_completes() {
        let mut app = test_app();
        app.screen = Screen::PatientForm;
        app.submit_patient_form();

        assert_eq!(app.screen, Screen::Result);
        match &app.result_state {
            ResultState::Complete { assessment } => {
                assert_eq!(assessment.risk_tier, Some(RiskTier::Moderate));
            }
            other => panic!("expected completed assessment, got {other:?}"),
        }
        assert_eq!(app.dashboard_state.session.total, 1);
        assert_eq!(app.dashboard_state.session.moderate, 1);
    }

    #[test]
    fn test_invalid_input_stays_on_form() {
        let mut app = test_app();
        app.screen = Screen::PatientForm;
        // ap_hi below ap_lo
        app.patient_form_state.fields[3].value = "70".to_string();
        app.submit_patient_form();

        assert_eq!(app.screen, Screen::PatientForm);
        assert!(app.patient_form_state.error_message.is_some());
        assert_eq!(app.dashboard_state.session.total, 0);
    }

    #[test]
    fn test_unavailable_service_reports_error() {
        let mut app = App::with_service(Arc::new(InferenceService::unavailable()));
        app.screen = Screen::PatientForm;
        app.submit_patient_form();

        assert_eq!(app.screen, Screen::Result);
        assert!(matches!(app.result_state, ResultState::Error { .. }));
    }
}
