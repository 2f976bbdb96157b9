pub mod executions;
pub mod logs;
pub mod pipelines;
pub mod yaml;

use ratatui::{
    prelude::*,
    widgets::{Clear, Paragraph, Tabs},
};

use crate::app::{App, Focus, Tab};

pub fn draw(frame: &mut Frame, app: &App) {
    let outer = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).split(frame.area());
    let columns =
        Layout::horizontal([Constraint::Percentage(32), Constraint::Percentage(68)]).split(outer[0]);

    pipelines::render(frame, app, columns[0]);

    let right = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).split(columns[1]);

    let index = match app.tab {
        Tab::Executions => 0,
        Tab::Yaml => 1,
        Tab::Logs => 2,
    };
    let tabs = Tabs::new(vec!["Executions [e]", "YAML [y]", "Logs [l]"])
        .select(index)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, right[0]);

    match app.tab {
        Tab::Executions => executions::render(frame, app, right[1]),
        Tab::Yaml => yaml::render(frame, app, right[1]),
        Tab::Logs => logs::render(frame, app, right[1]),
    }

    render_status_bar(frame, app, outer[1]);
    render_toasts(frame, app);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let hints = match app.focus {
        Focus::Search => "Enter apply · Esc back",
        Focus::Pipelines => "↑↓ select · Enter open · / search · e/y/l tabs · q quit",
        Focus::Main => match app.tab {
            Tab::Executions => "↑↓ select · Enter logs · p pipelines · q quit",
            Tab::Yaml => "↑↓/PgUp/PgDn scroll · p pipelines · q quit",
            Tab::Logs => "↑↓ step · Enter tail · PgUp/PgDn scroll · End follow · q quit",
        },
    };
    let bar = Paragraph::new(hints).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(bar, area);
}

fn render_toasts(frame: &mut Frame, app: &App) {
    if app.toasts.is_empty() {
        return;
    }
    let area = frame.area();
    let width = area.width.min(60);
    let height = app.toasts.len() as u16;
    let rect = Rect {
        x: area.width.saturating_sub(width + 1),
        y: area.height.saturating_sub(height + 2),
        width,
        height,
    };

    let text: Vec<Line> = app
        .toasts
        .iter()
        .map(|toast| Line::from(toast.text.clone()))
        .collect();
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::Black).bg(Color::Yellow)),
        rect,
    );
}

/// Shared status-to-color mapping for pipeline and execution states.
pub(crate) fn status_style(status: &str) -> Style {
    match status {
        "Success" => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        "Failed" => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        "Aborted" => Style::default().fg(Color::Yellow),
        "Expired" => Style::default().fg(Color::Red).add_modifier(Modifier::DIM),
        "Running" => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        _ => Style::default(),
    }
}
