//! JSON output formatting

use serde_json::{json, Value};

use crate::changes::prune_changes;
use crate::eval::EvalResult;
use crate::workspace::{RemovalOutcome, Workspace};

fn result_value(res: &EvalResult) -> Value {
    let mut value = serde_json::to_value(res).unwrap_or(json!(null));
    if let Value::Object(ref mut map) = value {
        map.insert("log".to_string(), json!(res.log_text()));
        map.insert(
            "pruned_changes".to_string(),
            serde_json::to_value(prune_changes(&res.changes)).unwrap_or(json!([])),
        );
    }
    value
}

pub fn format_result_json(res: &EvalResult) -> String {
    serde_json::to_string_pretty(&result_value(res)).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_history_json(ws: &Workspace) -> String {
    let data = json!({
        "base_image": ws.base_image(),
        "current_image": ws.current_image(),
        "history": ws.history().iter().map(result_value).collect::<Vec<_>>(),
    });
    serde_json::to_string_pretty(&data).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_removals_json(outcomes: &[RemovalOutcome]) -> String {
    let items: Vec<Value> = outcomes
        .iter()
        .map(|o| {
            json!({
                "container_id": o.container_id,
                "error": o.error.as_ref().map(|e| e.to_string()),
            })
        })
        .collect();
    serde_json::to_string_pretty(&json!({ "removed": items })).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use crate::workspace::WorkspaceConfig;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_result_json_includes_log() {
        let engine = Arc::new(MemoryEngine::new().with_output(&["hi\n"]));
        let mut ws = Workspace::new(engine, "ubuntu:trusty", WorkspaceConfig::default());
        let res = ws.run("echo hi").await.unwrap();

        let value: Value = serde_json::from_str(&format_result_json(&res)).unwrap();
        assert_eq!(value["log"], "hi\n");
        assert_eq!(value["new_image"], "i1");
        assert_eq!(value["container_id"], "c1");
        assert!(value["duration_ms"].is_u64());
    }
}
