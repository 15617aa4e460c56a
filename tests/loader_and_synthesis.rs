//! Directory-driven loading and registration-graph synthesis, end to end:
//! write JSON fixtures to a scratch directory, load them through
//! [`flowcraft::loader::load_dir`], and drive the synthesized graph through
//! a full flow.

mod common;

use std::collections::HashMap;

use flowcraft::cache::{ContextStore, GraphCache};
use flowcraft::engine::{FlowEngine, StepRequest};
use flowcraft::loader;

const AUTH_DEFAULT: &str = r#"
{
  "id": "AUTH_default",
  "type": "AUTHENTICATION",
  "nodes": [
    { "id": "start", "type": "START", "on_success": "login" },
    {
      "id": "login",
      "type": "PROMPT",
      "inputs": [
        { "ref": "u", "identifier": "username", "type": "text", "required": true },
        { "ref": "p", "identifier": "password", "type": "text", "required": true }
      ],
      "actions": [ { "ref": "submit", "next_node": "auth" } ]
    },
    {
      "id": "auth",
      "type": "TASK_EXECUTION",
      "executor": { "name": "BasicAuth" },
      "on_success": "end"
    },
    { "id": "end", "type": "END" }
  ]
}
"#;

#[tokio::test]
async fn registration_graph_is_synthesized_with_resolver_and_provisioning() {
    let dir = common::scratch_dir("synthesis");
    common::write_fixture(&dir, "auth_default.json", AUTH_DEFAULT);

    let registry = common::test_registry();
    let result = loader::load_dir(&dir, &registry, "AUTH_default").unwrap();

    assert!(result.diagnostics.is_empty());
    assert!(result.graphs.contains_key("AUTH_default"));
    let registration = result.graphs.get("REGISTRATION_default").expect("registration graph synthesized");

    // start -> __synthesized_user_type_resolver -> login -> auth
    // -> __synthesized_provisioning -> end.
    assert_eq!(registration.nodes.len(), 6);
    assert!(!registration.adjacency.get("auth").unwrap().contains(&"end".to_string()));
    assert!(registration.nodes.keys().any(|id| id.contains("provisioning")));
    assert!(registration.nodes.keys().any(|id| id.contains("user_type_resolver")));
}

#[tokio::test]
async fn loaded_auth_graph_runs_end_to_end() {
    let dir = common::scratch_dir("auth-e2e");
    common::write_fixture(&dir, "auth_default.json", AUTH_DEFAULT);

    let registry = common::test_registry();
    let result = loader::load_dir(&dir, &registry, "AUTH_default").unwrap();

    let engine =
        FlowEngine::new(result.graphs, GraphCache::new(), ContextStore::new(std::time::Duration::from_secs(60)));

    let first = engine
        .step(StepRequest { graph_id: "AUTH_default".to_string(), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(first.response.inputs.len(), 2);

    let mut user_inputs = HashMap::new();
    user_inputs.insert("username".to_string(), "alice".to_string());
    user_inputs.insert("password".to_string(), "hunter2".to_string());

    let second = engine
        .step(StepRequest {
            flow_id: Some(first.flow_id.clone()),
            user_inputs,
            current_action: "submit".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(second.response.status, Some(flowcraft::context::NodeStatus::Complete));
    let user = second.response.authenticated_user.unwrap();
    assert_eq!(user.user_id, "42");
    assert!(user.is_authenticated);
}
