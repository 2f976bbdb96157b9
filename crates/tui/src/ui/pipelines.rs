use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::{App, Focus};

use super::status_style;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).split(area);

    let search_border = if app.focus == Focus::Search {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let search = Paragraph::new(app.search.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Search [/]")
            .border_style(search_border),
    );
    frame.render_widget(search, chunks[0]);

    let visible = app.visible_pipelines();
    let items: Vec<ListItem> = visible
        .iter()
        .map(|pipeline| {
            let status = pipeline
                .execution_summary
                .last_execution_status
                .as_deref()
                .unwrap_or("—");
            ListItem::new(Line::from(vec![
                Span::raw(pipeline.name.clone()),
                Span::raw("  "),
                Span::styled(status.to_string(), status_style(status)),
            ]))
        })
        .collect();

    let border = if app.focus == Focus::Pipelines {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Pipelines [p] ({})", visible.len()))
                .border_style(border),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !visible.is_empty() {
        state.select(Some(app.selected_pipeline));
    }
    frame.render_stateful_widget(list, chunks[1], &mut state);
}
