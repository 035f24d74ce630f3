use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Padding, Paragraph};

use crate::app::{App, Page, StatusKind};
use crate::scripts::ScriptState;
use crate::theme::Theme;

const TITLE_BAR_HEIGHT: u16 = 3;
const STATUS_HEIGHT: u16 = 7;
const TEXT_PADDING: u16 = 1;
const SCRIPT_PREVIEW_LINES: usize = 12;
const STATUS_LOG_LINES: usize = 4;
const HELP_TEXT: &str =
    "Tab page | Enter submit | Up/Down select | Ctrl+E expand | Ctrl+G script | Ctrl+S save | Ctrl+C quit";

pub fn render(frame: &mut Frame, app: &App, theme: &Theme) {
    let [title_area, body, status] = Layout::vertical([
        Constraint::Length(TITLE_BAR_HEIGHT),
        Constraint::Min(0),
        Constraint::Length(STATUS_HEIGHT),
    ])
    .areas(frame.area());

    frame.render_widget(
        Block::default().style(Style::default().bg(theme.body_bg)),
        frame.area(),
    );

    render_title_bar(frame, title_area, app, theme);
    match app.page() {
        Page::KnowledgeBase => render_knowledge_base_page(frame, body, app, theme),
        Page::TestCases => render_test_cases_page(frame, body, app, theme),
    }
    render_status_bar(frame, status, app, theme);
}

fn render_title_bar(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let tab_style = |active: bool| {
        if active {
            Style::default().fg(theme.active_fg).bg(theme.input_bg)
        } else {
            Style::default().fg(theme.muted_fg)
        }
    };
    let line = Line::from(vec![
        Span::styled(
            "Autonomous QA Console",
            Style::default().fg(theme.active_fg),
        ),
        Span::raw("   "),
        Span::styled(
            " Knowledge Base ",
            tab_style(app.page() == Page::KnowledgeBase),
        ),
        Span::raw(" "),
        Span::styled(" Test Cases ", tab_style(app.page() == Page::TestCases)),
        Span::raw("   "),
        Span::styled(
            format!("session {}", app.session().id()),
            Style::default().fg(theme.muted_fg),
        ),
    ]);
    frame.render_widget(
        Paragraph::new(line)
            .style(Style::default().bg(theme.status_bg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.status_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        area,
    );
}

fn render_knowledge_base_page(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let [hint_area, input_area, files_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    frame.render_widget(
        Paragraph::new("Documents to upload (comma separated paths), Enter uploads:")
            .style(Style::default().bg(theme.body_bg).fg(theme.muted_fg)),
        hint_area,
    );
    render_input_box(frame, input_area, app.knowledge_input(), app, theme);

    let mut lines: Vec<Line> = vec![Line::styled(
        "Ingested Files",
        Style::default().fg(theme.active_fg),
    )];
    if app.registry().is_empty() {
        lines.push(Line::styled(
            "No documents ingested yet.",
            Style::default().fg(theme.muted_fg),
        ));
    } else {
        for filename in app.registry().iter_sorted() {
            lines.push(Line::styled(
                format!("+ {filename}"),
                Style::default().fg(theme.success_fg),
            ));
        }
    }
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().bg(theme.panel_bg).fg(theme.text_fg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.panel_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        files_area,
    );
}

fn render_test_cases_page(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let [hint_area, input_area, list_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    frame.render_widget(
        Paragraph::new("Feature to test, Enter generates test cases:")
            .style(Style::default().bg(theme.body_bg).fg(theme.muted_fg)),
        hint_area,
    );
    render_input_box(frame, input_area, app.query_input(), app, theme);

    let (lines, selected_line) = test_case_lines(app, theme);
    let visible = list_area.height.saturating_sub(TEXT_PADDING * 2).max(1);
    let scroll = (selected_line as u16).saturating_sub(visible / 2);
    frame.render_widget(
        Paragraph::new(lines)
            .scroll((scroll, 0))
            .style(Style::default().bg(theme.panel_bg).fg(theme.text_fg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.panel_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        list_area,
    );
}

/// Builds the case list with per-item detail expansion and script status.
/// Returns the lines plus the line index of the selected case header so the
/// view can keep it scrolled into sight.
fn test_case_lines<'a>(app: &'a App, theme: &Theme) -> (Vec<Line<'a>>, usize) {
    let mut lines: Vec<Line> = Vec::new();
    let mut selected_line = 0;

    if app.cases().is_empty() {
        lines.push(Line::styled(
            "No test cases yet. Describe a feature above and press Enter.",
            Style::default().fg(theme.muted_fg),
        ));
        return (lines, selected_line);
    }

    for (index, case) in app.cases().iter().enumerate() {
        let key = app.case_key(index).unwrap_or_default();
        let state = app.script_state_for(index);
        let selected = index == app.selected();
        if selected {
            selected_line = lines.len();
        }

        let marker = if selected { "> " } else { "  " };
        let status_note = match state {
            ScriptState::NotRequested => "",
            ScriptState::InFlight => "  [generating...]",
            ScriptState::Ready(_) => "  [script ready]",
            ScriptState::Failed(_) => "  [script failed]",
        };
        let header_style = if selected {
            Style::default().fg(theme.active_fg)
        } else {
            Style::default().fg(theme.text_fg)
        };
        lines.push(Line::styled(
            format!(
                "{marker}{key}: {} ({}){status_note}",
                case.test_scenario, case.test_type
            ),
            header_style,
        ));

        if app.expanded_key() != Some(key.as_str()) {
            continue;
        }

        let detail = Style::default().fg(theme.muted_fg);
        lines.push(Line::styled(format!("    Feature: {}", case.feature), detail));
        lines.push(Line::styled(
            format!("    Expected Result: {}", case.expected_result),
            detail,
        ));
        lines.push(Line::styled(
            format!("    Grounded In: {}", case.grounded_in),
            detail,
        ));
        match state {
            ScriptState::NotRequested => {
                lines.push(Line::styled(
                    "    Ctrl+G generates an automation script for this case.",
                    detail,
                ));
            }
            ScriptState::InFlight => {
                lines.push(Line::styled(
                    format!("    Generating script for {key}..."),
                    Style::default().fg(theme.warning_fg),
                ));
            }
            ScriptState::Failed(message) => {
                lines.push(Line::styled(
                    format!("    Script generation failed: {message}"),
                    Style::default().fg(theme.error_fg),
                ));
            }
            ScriptState::Ready(script) => {
                lines.push(Line::styled(
                    "    Script (Ctrl+S saves):",
                    Style::default().fg(theme.success_fg),
                ));
                for script_line in script.lines().take(SCRIPT_PREVIEW_LINES) {
                    lines.push(Line::styled(format!("      {script_line}"), detail));
                }
                if script.lines().count() > SCRIPT_PREVIEW_LINES {
                    lines.push(Line::styled("      ...", detail));
                }
            }
        }
        lines.push(Line::raw(""));
    }

    (lines, selected_line)
}

fn render_input_box(frame: &mut Frame, area: Rect, text: &str, app: &App, theme: &Theme) {
    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().bg(theme.input_bg).fg(theme.text_fg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.input_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        area,
    );

    let inner = area.inner(Margin {
        horizontal: TEXT_PADDING,
        vertical: TEXT_PADDING,
    });
    if inner.width > 0 && inner.height > 0 {
        let cursor_col = (app.input_cursor() as u16).min(inner.width.saturating_sub(1));
        frame.set_cursor_position((inner.x.saturating_add(cursor_col), inner.y));
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let mut lines: Vec<Line> = Vec::new();
    let recent = app
        .status_lines()
        .iter()
        .rev()
        .take(STATUS_LOG_LINES)
        .rev();
    for status in recent {
        let color = match status.kind {
            StatusKind::Info => theme.muted_fg,
            StatusKind::Success => theme.success_fg,
            StatusKind::Warning => theme.warning_fg,
            StatusKind::Error => theme.error_fg,
        };
        lines.push(Line::styled(
            status.text.clone(),
            Style::default().fg(color),
        ));
    }
    match app.busy() {
        Some(busy) => lines.push(Line::styled(
            format!("* {busy}"),
            Style::default().fg(theme.warning_fg),
        )),
        None => lines.push(Line::styled(
            HELP_TEXT,
            Style::default().fg(theme.muted_fg),
        )),
    }

    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().bg(theme.status_bg))
            .block(
                Block::default()
                    .style(Style::default().bg(theme.status_bg))
                    .padding(Padding::uniform(TEXT_PADDING)),
            ),
        area,
    );
}

#[cfg(test)]
#[path = "../tests/unit/ui_tests.rs"]
mod tests;
