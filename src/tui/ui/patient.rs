//! Patient data input form.
//!
//! Fields map one-to-one onto the serving schema's raw inputs. An empty
//! field falls back to the schema default when the form is submitted, same
//! as the HTTP front-end.

use std::collections::HashMap;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::domain::PatientInput;
use crate::tui::styles::CardioTheme;

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    /// Wire key, matching the serving schema.
    pub key: &'static str,
    pub label: &'static str,
    pub hint: &'static str,
    pub value: String,
}

impl FormField {
    fn new(key: &'static str, label: &'static str, hint: &'static str) -> Self {
        Self {
            key,
            label,
            hint,
            value: String::new(),
        }
    }
}

/// Patient form state
pub struct PatientFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for PatientFormState {
    fn default() -> Self {
        Self {
            fields: vec![
                FormField::new("gender", "Gender", "0=female, 1=male (default 0)"),
                FormField::new("height", "Height", "cm (default 170)"),
                FormField::new("weight", "Weight", "kg (default 70)"),
                FormField::new("ap_hi", "Systolic BP", "mmHg (default 120)"),
                FormField::new("ap_lo", "Diastolic BP", "mmHg (default 80)"),
                FormField::new("cholesterol", "Cholesterol", "1=normal 2=above 3=well above"),
                FormField::new("gluc", "Glucose", "1=normal 2=above 3=well above"),
                FormField::new("smoke", "Smoker", "0=no, 1=yes (default 0)"),
                FormField::new("alco", "Alcohol", "0=no, 1=yes (default 0)"),
                FormField::new("active", "Active", "0=no, 1=yes (default 1)"),
                FormField::new("Age_Year", "Age", "years (default 45)"),
            ],
            selected_field: 0,
            error_message: None,
        }
    }
}

impl PatientFormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current field
    pub fn input_char(&mut self, c: char) {
        if c.is_ascii_digit() || c == '.' {
            self.fields[self.selected_field].value.push(c);
            self.error_message = None;
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        self.fields[self.selected_field].value.pop();
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        self.fields[self.selected_field].value.clear();
    }

    /// Build a `PatientInput` from the current buffers.
    ///
    /// Empty fields are omitted so the schema defaults apply; full
    /// validation happens in the inference service.
    pub fn to_patient_input(&self) -> Result<PatientInput, String> {
        let mut kv = HashMap::new();
        for field in self.fields.iter().filter(|f| !f.value.is_empty()) {
            kv.insert(field.key.to_string(), field.value.clone());
        }
        PatientInput::from_key_values(&kv)
    }

    /// Load sample data (typical moderate-risk patient)
    pub fn load_sample_data(&mut self) {
        let sample = [
            "1",   // gender
            "168", // height (cm)
            "82",  // weight (kg)
            "138", // ap_hi (mmHg)
            "88",  // ap_lo (mmHg)
            "2",   // cholesterol
            "1",   // gluc
            "0",   // smoke
            "0",   // alco
            "0",   // active
            "54",  // Age_Year
        ];
        for (field, val) in self.fields.iter_mut().zip(sample) {
            field.value = val.to_string();
        }
    }
}

/// Render the patient data input form
pub fn render_patient_form(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", CardioTheme::text()),
        Span::styled("Patient Data Entry", CardioTheme::title()),
        Span::styled(
            " │ Empty fields use population defaults",
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

fn render_form_fields(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = (state.fields.len() + 1) / 2;

    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[mid..],
        mid,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let field_height = 3;
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(field_height))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let border_style = if is_selected {
            CardioTheme::border_focused()
        } else {
            CardioTheme::border()
        };

        let title_style = if is_selected {
            CardioTheme::focused()
        } else {
            CardioTheme::text_secondary()
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let value_display = if field.value.is_empty() {
            Span::styled(field.hint, CardioTheme::text_muted())
        } else {
            Span::styled(&field.value, CardioTheme::text())
        };

        let content = Paragraph::new(Line::from(vec![
            Span::raw(" "),
            value_display,
            if is_selected {
                Span::styled("▌", CardioTheme::focused())
            } else {
                Span::raw("")
            },
        ]))
        .block(block);

        f.render_widget(content, chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", CardioTheme::danger()),
            Span::styled(err.clone(), CardioTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", CardioTheme::key_hint()),
            Span::styled("Navigate ", CardioTheme::key_desc()),
            Span::styled("[Enter] ", CardioTheme::key_hint()),
            Span::styled("Submit ", CardioTheme::key_desc()),
            Span::styled("[S] ", CardioTheme::key_hint()),
            Span::styled("Sample Data ", CardioTheme::key_desc()),
            Span::styled("[Esc] ", CardioTheme::key_hint()),
            Span::styled("Cancel", CardioTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(CardioTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_form_uses_defaults() {
        let state = PatientFormState::default();
        let input = state.to_patient_input().unwrap();
        assert_eq!(input, PatientInput::default());
    }

    #[test]
    fn test_filled_fields_override_defaults() {
        let mut state = PatientFormState::default();
        state.load_sample_data();
        let input = state.to_patient_input().unwrap();
        assert_eq!(input.gender, 1);
        assert_eq!(input.ap_hi, 138.0);
        assert_eq!(input.age_year, 54.0);
    }

    #[test]
    fn test_input_char_rejects_letters() {
        let mut state = PatientFormState::default();
        state.input_char('x');
        assert!(state.fields[0].value.is_empty());
        state.input_char('7');
        assert_eq!(state.fields[0].value, "7");
    }

    #[test]
    fn test_field_navigation_wraps() {
        let mut state = PatientFormState::default();
        state.prev_field();
        assert_eq!(state.selected_field, state.fields.len() - 1);
        state.next_field();
        assert_eq!(state.selected_field, 0);
    }
}
