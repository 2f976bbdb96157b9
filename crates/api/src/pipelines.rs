use std::sync::Arc;

use crate::{
    client::ApiContext,
    error::ApiError,
    models::{Envelope, Execution, ExecutionDetail, Page, PipelineSummary, PipelineYaml},
};

/// Client for the pipeline endpoints.
#[derive(Debug, Clone)]
pub struct PipelineClient {
    ctx: Arc<ApiContext>,
}

impl PipelineClient {
    pub fn new(ctx: Arc<ApiContext>) -> Self {
        Self { ctx }
    }

    /// List pipelines in the configured project, optionally filtered by a
    /// server-side search term.
    pub async fn list(&self, search_term: Option<&str>) -> Result<Vec<PipelineSummary>, ApiError> {
        let mut query: Vec<(&str, &str)> = self.ctx.scope_params().to_vec();
        query.push(("page", "0"));
        query.push(("size", "25"));
        if let Some(term) = search_term {
            query.push(("searchTerm", term));
        }

        let page: Envelope<Page<PipelineSummary>> =
            self.ctx.post_json("pipelines/list", &query).await?;
        Ok(page.data.content)
    }

    /// Fetch the raw YAML document of one pipeline. Rendered verbatim.
    pub async fn pipeline_yaml(&self, pipeline_id: &str) -> Result<String, ApiError> {
        let query = self.ctx.scope_params();
        let payload: Envelope<PipelineYaml> = self
            .ctx
            .get_json(&format!("pipelines/{pipeline_id}"), &query)
            .await?;
        Ok(payload.data.yaml_pipeline)
    }

    /// Recent executions of one pipeline, newest first.
    pub async fn executions(
        &self,
        pipeline_id: &str,
        size: u32,
    ) -> Result<Vec<Execution>, ApiError> {
        let size = size.to_string();
        let mut query: Vec<(&str, &str)> = self.ctx.scope_params().to_vec();
        query.push(("pipelineIdentifier", pipeline_id));
        query.push(("page", "0"));
        query.push(("size", size.as_str()));

        let page: Envelope<Page<Execution>> = self
            .ctx
            .post_json("pipelines/execution/summary", &query)
            .await?;
        Ok(page.data.content)
    }

    /// The node graph of one execution, used to enumerate log keys.
    pub async fn execution_detail(
        &self,
        plan_execution_id: &str,
    ) -> Result<ExecutionDetail, ApiError> {
        let query = self.ctx.scope_params();
        let payload: Envelope<ExecutionDetail> = self
            .ctx
            .get_json(&format!("pipelines/execution/v2/{plan_execution_id}"), &query)
            .await?;
        Ok(payload.data)
    }
}
