//! Integration tests for the pipeline REST client against a mock server.

use std::sync::Arc;

use api::{ApiContext, ApiError, ApiScope, PipelineClient};
use serde_json::json;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

fn test_client(server: &MockServer) -> PipelineClient {
    let base = Url::parse(&format!("{}/", server.uri())).unwrap();
    let ctx = ApiContext::new(
        base,
        "test-key",
        ApiScope {
            account: "acct".into(),
            org: "org".into(),
            project: "proj".into(),
        },
    )
    .unwrap();
    PipelineClient::new(Arc::new(ctx))
}

#[tokio::test]
async fn list_parses_page_content_and_sends_scope() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pipelines/list"))
        .and(query_param("accountIdentifier", "acct"))
        .and(query_param("projectIdentifier", "proj"))
        .and(header("x-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "content": [
                    {
                        "name": "Nightly",
                        "identifier": "nightly",
                        "numOfStages": 1,
                        "createdAt": 1716926437000u64,
                        "lastUpdatedAt": 1716926437000u64,
                        "stageNames": ["Build"]
                    }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pipelines = test_client(&server).list(None).await.unwrap();
    assert_eq!(pipelines.len(), 1);
    assert_eq!(pipelines[0].identifier, "nightly");
}

#[tokio::test]
async fn list_passes_search_term() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pipelines/list"))
        .and(query_param("searchTerm", "deploy"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"content": []}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let pipelines = test_client(&server).list(Some("deploy")).await.unwrap();
    assert!(pipelines.is_empty());
}

#[tokio::test]
async fn non_2xx_maps_to_status_error_with_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pipelines/broken"))
        .respond_with(ResponseTemplate::new(404).set_body_string("pipeline not found"))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .pipeline_yaml("broken")
        .await
        .unwrap_err();
    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "pipeline not found");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn execution_detail_exposes_node_map() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pipelines/execution/v2/plan-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "executionGraph": {
                    "nodeMap": {
                        "n1": {
                            "name": "Run",
                            "identifier": "run",
                            "stepType": "ShellScript",
                            "status": "Success",
                            "logBaseKey": "accountId:acct/orgId:org/projectId:proj/pipelineId:x/runSequence:1/level0:pipeline"
                        },
                        "n2": {
                            "name": "Wait",
                            "identifier": "wait",
                            "stepType": "ManualApproval",
                            "status": "Success"
                        }
                    }
                }
            }
        })))
        .mount(&server)
        .await;

    let detail = test_client(&server)
        .execution_detail("plan-1")
        .await
        .unwrap();
    assert_eq!(detail.execution_graph.node_map.len(), 2);
    assert!(detail.execution_graph.node_map["n2"].log_base_key.is_none());
}
