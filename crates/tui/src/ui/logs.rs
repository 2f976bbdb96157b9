use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::{App, Focus};

use super::status_style;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks =
        Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)]).split(area);

    render_steps(frame, app, chunks[0]);
    render_log_pane(frame, app, chunks[1]);
}

fn render_steps(frame: &mut Frame, app: &App, area: Rect) {
    let border = if app.focus == Focus::Main {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Steps")
        .border_style(border);

    if app.graph_loading {
        frame.render_widget(Paragraph::new("Loading execution graph…").block(block), area);
        return;
    }
    if app.graph_nodes.is_empty() {
        frame.render_widget(
            Paragraph::new("Select an execution to list its steps.").block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = app
        .graph_nodes
        .iter()
        .map(|node| {
            let marker = if node.log_base_key.is_some() { "" } else { " (no logs)" };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{}{marker}  ", node.name)),
                Span::styled(node.status.clone(), status_style(&node.status)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.selected_node));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_log_pane(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Logs");

    // Chunks are newline-terminated; flatten them into display rows.
    let rows: Vec<String> = app
        .pane
        .lines()
        .iter()
        .flat_map(|chunk| {
            chunk
                .trim_end_matches('\n')
                .split('\n')
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();

    let height = area.height.saturating_sub(2) as usize;
    // Tail the buffer, offset by the scroll position.
    let end = rows.len().saturating_sub(app.log_scroll);
    let start = end.saturating_sub(height);
    let text: Vec<Line> = rows[start..end]
        .iter()
        .map(|row| Line::from(row.clone()))
        .collect();

    frame.render_widget(Paragraph::new(text).block(block), area);
}
