//! Wire models for the pipeline service.
//!
//! Field names follow the service's camelCase JSON; timestamps arrive as
//! epoch milliseconds.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Response envelope wrapping every endpoint's payload.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// Paged list payload.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Page<T> {
    #[serde(default)]
    pub content: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    pub name: String,
    pub identifier: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub num_of_stages: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated_at: DateTime<Utc>,
    #[serde(default)]
    pub stage_names: Vec<String>,
    #[serde(rename = "executionSummaryInfo", default)]
    pub execution_summary: ExecutionSummaryInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummaryInfo {
    #[serde(rename = "numOfErrors", default)]
    pub number_of_errors: Vec<i64>,
    #[serde(default)]
    pub deployments: Vec<i64>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_execution_ts: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_execution_status: Option<String>,
    #[serde(default)]
    pub last_execution_id: Option<String>,
}

/// One row of a pipeline's execution history.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub plan_execution_id: String,
    #[serde(default)]
    pub pipeline_identifier: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub run_sequence: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_ts: DateTime<Utc>,
    #[serde(default)]
    pub execution_trigger_info: TriggerInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerInfo {
    #[serde(default)]
    pub trigger_type: String,
    #[serde(default)]
    pub triggered_by: TriggeredBy,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggeredBy {
    #[serde(default)]
    pub identifier: String,
}

/// Full detail of one execution, including its node graph.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionDetail {
    #[serde(default)]
    pub execution_graph: ExecutionGraph,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionGraph {
    #[serde(default)]
    pub node_map: HashMap<String, ExecutionGraphNode>,
}

/// One step/stage node of an execution graph.
///
/// Immutable once fetched; a new fetch produces a new graph. A `None`
/// log_base_key means the node has no logs at all.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionGraphNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub step_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub log_base_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PipelineYaml {
    pub yaml_pipeline: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pipeline_summary_from_wire_shape() {
        let raw = r#"{
            "name": "Build and Deploy",
            "identifier": "build_deploy",
            "numOfStages": 2,
            "createdAt": 1716926437000,
            "lastUpdatedAt": 1716926437000,
            "stageNames": ["Build", "Deploy"],
            "executionSummaryInfo": {
                "numOfErrors": [0, 1],
                "deployments": [3, 4],
                "lastExecutionTs": 1716926437000,
                "lastExecutionStatus": "Success"
            }
        }"#;

        let summary: PipelineSummary = serde_json::from_str(raw).unwrap();
        assert_eq!(summary.identifier, "build_deploy");
        assert_eq!(summary.num_of_stages, 2);
        assert_eq!(summary.stage_names, vec!["Build", "Deploy"]);
        assert_eq!(summary.execution_summary.deployments, vec![3, 4]);
        assert_eq!(
            summary.execution_summary.last_execution_status.as_deref(),
            Some("Success")
        );
    }

    #[test]
    fn parses_execution_graph_node_with_missing_log_key() {
        let raw = r#"{
            "name": "Approval Step",
            "identifier": "approval",
            "stepType": "ManualApproval",
            "status": "Success"
        }"#;

        let node: ExecutionGraphNode = serde_json::from_str(raw).unwrap();
        assert_eq!(node.step_type, "ManualApproval");
        assert!(node.log_base_key.is_none());
    }

    #[test]
    fn parses_execution_detail_node_map() {
        let raw = r#"{
            "executionGraph": {
                "nodeMap": {
                    "n1": {
                        "name": "Run Tests",
                        "identifier": "run_tests",
                        "stepType": "ShellScript",
                        "status": "Running",
                        "logBaseKey": "accountId:a/orgId:o/projectId:p/pipelineId:x/runSequence:1/level0:pipeline"
                    }
                }
            }
        }"#;

        let detail: ExecutionDetail = serde_json::from_str(raw).unwrap();
        let node = &detail.execution_graph.node_map["n1"];
        assert_eq!(node.step_type, "ShellScript");
        assert!(node.log_base_key.as_deref().unwrap().starts_with("accountId:a/"));
    }

    #[test]
    fn missing_summary_info_defaults_to_empty() {
        let raw = r#"{
            "name": "Minimal",
            "identifier": "minimal",
            "createdAt": 0,
            "lastUpdatedAt": 0
        }"#;

        let summary: PipelineSummary = serde_json::from_str(raw).unwrap();
        assert!(summary.execution_summary.deployments.is_empty());
        assert!(summary.execution_summary.last_execution_ts.is_none());
    }
}
