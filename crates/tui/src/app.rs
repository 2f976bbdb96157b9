use std::{
    collections::VecDeque,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use api::{
    ApiContext, ApiScope, PipelineClient,
    models::{Execution, ExecutionGraphNode, PipelineSummary},
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use logs::{LogClient, LogKey, LogServiceConfig, LogSource, reconcile};
use services::services::{
    cache::LogCache,
    scanner::{ScanOutcome, ScanService},
    search::DisabledIndex,
};
use tokio::sync::mpsc::UnboundedSender;
use utils::line_store::LineEvent;

use crate::{adapter::LogPane, config::AppConfig, events::AppEvent};

/// Rows fetched for the execution history view.
const EXECUTION_HISTORY_SIZE: u32 = 35;

/// Step types whose log key needs the command-unit qualifier.
const COMMAND_UNIT_STEP_TYPES: &[&str] = &["ShellScript"];

const TOAST_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Executions,
    Yaml,
    Logs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    Pipelines,
    Main,
}

#[derive(Debug)]
pub struct Toast {
    pub text: String,
    created: Instant,
}

pub struct App {
    pipelines_client: PipelineClient,
    log_client: Arc<LogClient>,
    scanner: Arc<ScanService>,
    tx: UnboundedSender<AppEvent>,

    pub focus: Focus,
    pub tab: Tab,
    pub should_quit: bool,

    pub pipelines: Vec<PipelineSummary>,
    pub selected_pipeline: usize,
    pub search: String,
    /// Identifier whose executions/YAML are currently shown, to avoid
    /// refetching on every poll refresh.
    highlighted: Option<String>,

    pub executions: Vec<Execution>,
    pub selected_execution: usize,
    pub executions_loading: bool,

    pub yaml: String,
    pub yaml_scroll: u16,

    pub graph_nodes: Vec<ExecutionGraphNode>,
    pub selected_node: usize,
    pub graph_loading: bool,

    pub pane: Arc<LogPane>,
    /// Lines scrolled up from the tail of the log view.
    pub log_scroll: usize,

    pub toasts: VecDeque<Toast>,

    // Supersede tokens: results tagged with an older value are dropped.
    list_generation: u64,
    graph_generation: u64,
}

impl App {
    pub fn new(config: &AppConfig, tx: UnboundedSender<AppEvent>) -> Result<Self> {
        let ctx = ApiContext::new(
            config.api_url.clone(),
            &config.api_key,
            ApiScope {
                account: config.account.clone(),
                org: config.org.clone(),
                project: config.project.clone(),
            },
        )
        .context("failed to build API context")?;
        let pipelines_client = PipelineClient::new(Arc::new(ctx));

        let log_client = Arc::new(LogClient::new(LogServiceConfig {
            base_url: config.log_url.clone(),
            api_key: config.api_key.clone(),
            account: config.account.clone(),
        }));

        let cache = LogCache::new(&config.data_dir, &config.account, &config.org, &config.project)
            .context("failed to create log cache directory")?;
        let scanner = Arc::new(ScanService::new(
            Arc::new(pipelines_client.clone()),
            log_client.clone() as Arc<dyn LogSource>,
            cache,
            Arc::new(DisabledIndex),
        ));

        Ok(Self {
            pipelines_client,
            log_client,
            scanner,
            tx,
            focus: Focus::Pipelines,
            tab: Tab::Executions,
            should_quit: false,
            pipelines: Vec::new(),
            selected_pipeline: 0,
            search: String::new(),
            highlighted: None,
            executions: Vec::new(),
            selected_execution: 0,
            executions_loading: false,
            yaml: String::new(),
            yaml_scroll: 0,
            graph_nodes: Vec::new(),
            selected_node: 0,
            graph_loading: false,
            pane: Arc::new(LogPane::new()),
            log_scroll: 0,
            toasts: VecDeque::new(),
            list_generation: 0,
            graph_generation: 0,
        })
    }

    pub fn scanner(&self) -> Arc<ScanService> {
        self.scanner.clone()
    }

    pub fn pipelines_client(&self) -> PipelineClient {
        self.pipelines_client.clone()
    }

    /// The pipeline whose executions/YAML panes are shown.
    pub fn highlighted_pipeline(&self) -> Option<&PipelineSummary> {
        self.visible_pipelines()
            .get(self.selected_pipeline)
            .copied()
    }

    /// Pipelines matching the current search text.
    pub fn visible_pipelines(&self) -> Vec<&PipelineSummary> {
        if self.search.is_empty() {
            return self.pipelines.iter().collect();
        }
        let needle = self.search.to_lowercase();
        self.pipelines
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.identifier.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Tick => self.expire_toasts(),
            AppEvent::Resize | AppEvent::LogActivity => {}
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Pipelines(Ok(pipelines)) => {
                self.pipelines = pipelines;
                self.clamp_pipeline_selection();
                self.sync_highlight();
            }
            AppEvent::Pipelines(Err(e)) => {
                tracing::warn!(error = %e, "pipeline list refresh failed");
                self.toast(format!("Failed to list pipelines: {e}"));
            }
            AppEvent::Executions { generation, result } => {
                if generation != self.list_generation {
                    return;
                }
                self.executions_loading = false;
                match result {
                    Ok(executions) => {
                        self.executions = executions;
                        self.selected_execution = 0;
                    }
                    Err(e) => self.toast(format!("Failed to fetch executions: {e}")),
                }
            }
            AppEvent::Yaml { generation, result } => {
                if generation != self.list_generation {
                    return;
                }
                match result {
                    Ok(yaml) => {
                        self.yaml = yaml;
                        self.yaml_scroll = 0;
                    }
                    Err(e) => self.toast(format!("Failed to fetch pipeline YAML: {e}")),
                }
            }
            AppEvent::ExecutionGraph { generation, result } => {
                if generation != self.graph_generation {
                    return;
                }
                self.graph_loading = false;
                match result {
                    Ok(detail) => {
                        let mut nodes: Vec<_> =
                            detail.execution_graph.node_map.into_values().collect();
                        nodes.sort_by(|a, b| a.name.cmp(&b.name));
                        self.graph_nodes = nodes;
                        self.selected_node = 0;
                    }
                    Err(e) => self.toast(format!("Failed to fetch execution graph: {e}")),
                }
            }
            AppEvent::Toast(text) => self.toast(text),
            AppEvent::ScanFinished(outcome) => match outcome {
                ScanOutcome::Completed(stats) => {
                    self.toast(format!(
                        "Log cache refreshed: {} file(s) from {} pipeline(s)",
                        stats.files_written, stats.pipelines
                    ));
                }
                ScanOutcome::CoolingDown | ScanOutcome::AlreadyRunning => {}
            },
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.focus == Focus::Search {
            self.handle_search_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('/') | KeyCode::Char('s') | KeyCode::Char('f') => {
                self.focus = Focus::Search;
            }
            KeyCode::Char('p') => self.focus = Focus::Pipelines,
            KeyCode::Char('e') => {
                self.tab = Tab::Executions;
                self.focus = Focus::Main;
            }
            KeyCode::Char('y') => {
                self.tab = Tab::Yaml;
                self.focus = Focus::Main;
            }
            KeyCode::Char('l') => {
                self.tab = Tab::Logs;
                self.focus = Focus::Main;
            }
            _ => match self.focus {
                Focus::Pipelines => self.handle_pipelines_key(key),
                Focus::Main => self.handle_main_key(key),
                Focus::Search => {}
            },
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.focus = Focus::Pipelines,
            KeyCode::Enter => {
                self.focus = Focus::Pipelines;
                self.selected_pipeline = 0;
                // Ask the server too; typing already filtered client-side.
                self.refresh_pipelines(Some(self.search.clone()));
            }
            KeyCode::Backspace => {
                self.search.pop();
                self.clamp_pipeline_selection();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.search.push(c);
                self.clamp_pipeline_selection();
            }
            _ => {}
        }
    }

    fn handle_pipelines_key(&mut self, key: KeyEvent) {
        let count = self.visible_pipelines().len();
        match key.code {
            KeyCode::Up if count > 0 => {
                self.selected_pipeline = self.selected_pipeline.saturating_sub(1);
                self.sync_highlight();
            }
            KeyCode::Down if count > 0 => {
                self.selected_pipeline = (self.selected_pipeline + 1).min(count - 1);
                self.sync_highlight();
            }
            KeyCode::Enter => self.focus = Focus::Main,
            _ => {}
        }
    }

    fn handle_main_key(&mut self, key: KeyEvent) {
        match self.tab {
            Tab::Executions => match key.code {
                KeyCode::Up if !self.executions.is_empty() => {
                    self.selected_execution = self.selected_execution.saturating_sub(1);
                }
                KeyCode::Down if !self.executions.is_empty() => {
                    self.selected_execution =
                        (self.selected_execution + 1).min(self.executions.len() - 1);
                }
                KeyCode::Enter => self.open_execution_logs(),
                _ => {}
            },
            Tab::Yaml => match key.code {
                KeyCode::Up => self.yaml_scroll = self.yaml_scroll.saturating_sub(1),
                KeyCode::Down => self.yaml_scroll = self.yaml_scroll.saturating_add(1),
                KeyCode::PageUp => self.yaml_scroll = self.yaml_scroll.saturating_sub(20),
                KeyCode::PageDown => self.yaml_scroll = self.yaml_scroll.saturating_add(20),
                _ => {}
            },
            Tab::Logs => match key.code {
                KeyCode::Up if !self.graph_nodes.is_empty() => {
                    self.selected_node = self.selected_node.saturating_sub(1);
                }
                KeyCode::Down if !self.graph_nodes.is_empty() => {
                    self.selected_node = (self.selected_node + 1).min(self.graph_nodes.len() - 1);
                }
                KeyCode::Enter => self.start_tail(),
                KeyCode::PageUp => self.log_scroll = self.log_scroll.saturating_add(10),
                KeyCode::PageDown => self.log_scroll = self.log_scroll.saturating_sub(10),
                KeyCode::End => self.log_scroll = 0,
                _ => {}
            },
        }
    }

    fn clamp_pipeline_selection(&mut self) {
        let count = self.visible_pipelines().len();
        if count == 0 {
            self.selected_pipeline = 0;
        } else if self.selected_pipeline >= count {
            self.selected_pipeline = count - 1;
        }
    }

    /// Fetch executions and YAML when the highlighted pipeline changed.
    fn sync_highlight(&mut self) {
        let Some(identifier) = self
            .visible_pipelines()
            .get(self.selected_pipeline)
            .map(|p| p.identifier.clone())
        else {
            return;
        };
        if self.highlighted.as_deref() == Some(identifier.as_str()) {
            return;
        }
        self.highlighted = Some(identifier.clone());

        // A new highlight supersedes in-flight fetches and stale views.
        self.list_generation += 1;
        let generation = self.list_generation;
        self.executions_loading = true;
        self.graph_nodes.clear();
        self.graph_loading = false;

        let client = self.pipelines_client.clone();
        let tx = self.tx.clone();
        let id = identifier.clone();
        tokio::spawn(async move {
            let result = client.executions(&id, EXECUTION_HISTORY_SIZE).await;
            let _ = tx.send(AppEvent::Executions { generation, result });
        });

        let client = self.pipelines_client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.pipeline_yaml(&identifier).await;
            let _ = tx.send(AppEvent::Yaml { generation, result });
        });
    }

    /// Fetch the node graph for the chosen execution and switch to the logs
    /// tab.
    fn open_execution_logs(&mut self) {
        let Some(plan_id) = self
            .executions
            .get(self.selected_execution)
            .map(|e| e.plan_execution_id.clone())
        else {
            return;
        };
        self.graph_generation += 1;
        let generation = self.graph_generation;
        self.graph_loading = true;
        self.tab = Tab::Logs;

        let client = self.pipelines_client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.execution_detail(&plan_id).await;
            let _ = tx.send(AppEvent::ExecutionGraph { generation, result });
        });
    }

    /// Start tailing the selected node's logs through the adapter.
    fn start_tail(&mut self) {
        let Some(node) = self.graph_nodes.get(self.selected_node) else {
            return;
        };
        let name = node.name.clone();
        let Some(key) = effective_log_key(node) else {
            // No log key means no fetch attempt at all.
            self.toast(format!("No logs for step \"{name}\""));
            return;
        };
        tracing::debug!(key = %key, step = %name, "starting log tail");

        self.log_scroll = 0;
        let (generation, store) = self.pane.select();

        // Producer: drive the reconciled sequence into the pane; the
        // write-time generation check discards superseded output.
        let pane = self.pane.clone();
        let source = self.log_client.clone() as Arc<dyn LogSource>;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let mut chunks = reconcile(source, key);
            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(text) => {
                        if !pane.on_line(generation, text) {
                            return; // superseded; drop the rest on the floor
                        }
                    }
                    Err(e) => {
                        let message = format!("Failed to fetch logs: {e}");
                        pane.on_notice(generation, format!("{message}\n"));
                        let _ = tx.send(AppEvent::Toast(message));
                        break;
                    }
                }
            }
            pane.finish(generation);
        });

        // Follower: nudge the UI loop whenever the buffer grows, replaying
        // history first in case lines landed before we subscribed.
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let mut events = store.history_plus_stream();
            while let Some(event) = events.next().await {
                if tx.send(AppEvent::LogActivity).is_err() {
                    break;
                }
                if matches!(event, LineEvent::Finished) {
                    break;
                }
            }
        });
    }

    pub fn refresh_pipelines(&self, search_term: Option<String>) {
        let client = self.pipelines_client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.list(search_term.as_deref()).await;
            let _ = tx.send(AppEvent::Pipelines(result));
        });
    }

    fn toast(&mut self, text: String) {
        tracing::debug!(toast = %text, "notify");
        self.toasts.push_back(Toast {
            text,
            created: Instant::now(),
        });
        while self.toasts.len() > 3 {
            self.toasts.pop_front();
        }
    }

    fn expire_toasts(&mut self) {
        let now = Instant::now();
        self.toasts
            .retain(|toast| now.duration_since(toast.created) < TOAST_TTL);
    }
}

/// The key to tail for a node, with the command-unit qualifier appended for
/// the step types that require it. `None` when the node has no logs.
fn effective_log_key(node: &ExecutionGraphNode) -> Option<LogKey> {
    let key = LogKey::new(node.log_base_key.clone()?);
    if COMMAND_UNIT_STEP_TYPES.contains(&node.step_type.as_str()) {
        Some(key.with_command_unit("Execute"))
    } else {
        Some(key)
    }
}
