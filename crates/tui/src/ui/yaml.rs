use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Pipeline YAML");
    let content = if app.yaml.is_empty() {
        "Select a pipeline to view its YAML."
    } else {
        app.yaml.as_str()
    };
    let paragraph = Paragraph::new(content)
        .block(block)
        .scroll((app.yaml_scroll, 0));
    frame.render_widget(paragraph, area);
}
