//! End-to-end workflow engine tests over the built-in integrations.

use std::collections::HashMap;

use serde_json::json;

use taskloom_workflow::{WorkflowEngine, WorkflowStatus};

#[tokio::test]
async fn daily_report_pipeline_runs_all_four_integrations() {
    let mut engine = WorkflowEngine::with_builtins();
    let wf = engine.create_workflow(
        "Daily Report Automation",
        "Fetch data, process it, and send reports via email and chat",
    );

    let fetch = engine
        .add_node(
            wf.id,
            "http_request",
            "Fetch Data",
            HashMap::from([
                ("method".to_string(), json!("GET")),
                ("url".to_string(), json!("https://api.example.com/data")),
            ]),
            (100, 100),
        )
        .unwrap();
    let sheets = engine
        .add_node(
            wf.id,
            "spreadsheet",
            "Save to Sheets",
            HashMap::from([
                ("operation".to_string(), json!("append")),
                ("spreadsheet_id".to_string(), json!("abc123")),
            ]),
            (300, 100),
        )
        .unwrap();
    let mail = engine
        .add_node(
            wf.id,
            "mail_send",
            "Send Email Report",
            HashMap::from([
                ("to".to_string(), json!("team@example.com")),
                ("subject".to_string(), json!("Daily Report")),
            ]),
            (500, 100),
        )
        .unwrap();
    let chat = engine
        .add_node(
            wf.id,
            "chat_post",
            "Notify Team",
            HashMap::from([
                ("channel".to_string(), json!("#reports")),
                ("text".to_string(), json!("Daily report sent")),
            ]),
            (700, 100),
        )
        .unwrap();

    engine.connect(wf.id, &fetch.id, &sheets.id).unwrap();
    engine.connect(wf.id, &sheets.id, &mail.id).unwrap();
    engine.connect(wf.id, &mail.id, &chat.id).unwrap();

    let record = engine.execute(wf.id, None).await.unwrap();

    assert_eq!(record.status, WorkflowStatus::Completed);
    assert_eq!(record.nodes_executed, 4);
    assert_eq!(record.workflow_name, "Daily Report Automation");
    assert_eq!(record.node_results[&fetch.id]["status_code"], 200);
    assert_eq!(record.node_results[&sheets.id]["rows_affected"], 1);
    assert_eq!(record.node_results[&mail.id]["to"], "team@example.com");
    assert_eq!(record.node_results[&chat.id]["channel"], "#reports");

    let stats = engine.statistics();
    assert_eq!(stats.total_executions, 1);
    assert_eq!(stats.successful_executions, 1);
    assert!((stats.success_rate - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn repeated_executions_accumulate_history() {
    let mut engine = WorkflowEngine::with_builtins();
    let wf = engine.create_workflow("Loop", "");
    engine
        .add_node(wf.id, "chat_post", "Ping", HashMap::new(), (0, 0))
        .unwrap();

    for _ in 0..3 {
        engine.execute(wf.id, None).await.unwrap();
    }

    assert_eq!(engine.execution_history(Some(wf.id)).len(), 3);
    assert_eq!(engine.execution_history(None).len(), 3);
    assert_eq!(engine.statistics().total_executions, 3);
}
