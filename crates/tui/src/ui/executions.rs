use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Sparkline, Table, TableState},
};

use crate::app::App;

use super::status_style;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).split(area);

    render_deployments(frame, app, chunks[0]);
    render_history(frame, app, chunks[1]);
}

fn render_deployments(frame: &mut Frame, app: &App, area: Rect) {
    let data: Vec<u64> = app
        .highlighted_pipeline()
        .map(|pipeline| {
            pipeline
                .execution_summary
                .deployments
                .iter()
                .map(|&n| n.max(0) as u64)
                .collect()
        })
        .unwrap_or_default();

    let sparkline = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title("Deployments"))
        .data(&data)
        .style(Style::default().fg(Color::Cyan));
    frame.render_widget(sparkline, area);
}

fn render_history(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Executions");

    if app.executions_loading {
        frame.render_widget(Paragraph::new("Loading executions…").block(block), area);
        return;
    }
    if app.executions.is_empty() {
        frame.render_widget(
            Paragraph::new("No executions for this pipeline.").block(block),
            area,
        );
        return;
    }

    let rows: Vec<Row> = app
        .executions
        .iter()
        .map(|execution| {
            Row::new(vec![
                Cell::from(execution.start_ts.format("%m/%d/%Y %H:%M:%S").to_string()),
                Cell::from(
                    execution
                        .execution_trigger_info
                        .triggered_by
                        .identifier
                        .clone(),
                ),
                Cell::from(execution.execution_trigger_info.trigger_type.clone()),
                Cell::from(Span::styled(
                    execution.status.clone(),
                    status_style(&execution.status),
                )),
                Cell::from(format!("#{}", execution.run_sequence)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(18),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
    )
    .header(
        Row::new(["Start Time", "Started By", "Trigger", "Status", "Run"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(block)
    .row_highlight_style(Style::default().bg(Color::DarkGray))
    .highlight_symbol("> ");

    let mut state = TableState::default();
    state.select(Some(app.selected_execution));
    frame.render_stateful_widget(table, area, &mut state);
}
