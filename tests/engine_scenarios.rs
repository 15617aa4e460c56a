//! End-to-end scenarios driving [`flowcraft::engine::FlowEngine`] over
//! graphs built directly (decision branch, onFailure recovery, condition
//! skip) without going through the JSON loader — see
//! `loader_and_synthesis.rs` for the JSON-driven scenarios.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use flowcraft::cache::{ContextStore, GraphCache};
use flowcraft::context::{Action, FlowType, NodeCondition};
use flowcraft::engine::{FlowEngine, StepRequest};
use flowcraft::graph::{Factory, Graph};
use flowcraft::node::{Node, NodeBase, RepresentationNode};

fn engine_with(graph: Graph) -> FlowEngine {
    let mut graphs = HashMap::new();
    graphs.insert(graph.id.clone(), graph);
    FlowEngine::new(graphs, GraphCache::new(), ContextStore::new(Duration::from_secs(3600)))
}

fn rep(id: &str, node_type: &str, on_success: Option<&str>) -> Node {
    Node::Representation(RepresentationNode {
        base: NodeBase::new(id, node_type),
        on_success: on_success.map(|s| s.to_string()),
    })
}

/// Start -> Decision(next=[end_pwd, end_otp]) -> End|End, per spec scenario 2.
fn decision_branch_graph() -> Graph {
    let mut g = Graph::new("AUTH_decision", FlowType::Authentication);
    g.add_node(rep("start", "START", Some("decide")));

    let decide = Factory::create_node("decide", "DECISION", Default::default(), false, false).unwrap();
    g.add_node(decide);

    g.add_node(rep("end_pwd", "END", None));
    g.add_node(rep("end_otp", "END", None));
    g.node_mut("end_pwd").unwrap().base_mut().is_final = true;
    g.node_mut("end_otp").unwrap().base_mut().is_final = true;

    g.add_edge("start", "decide").unwrap();
    g.add_edge("decide", "end_pwd").unwrap();
    g.add_edge("decide", "end_otp").unwrap();

    g.set_start_node("start");
    g.node_mut("start").unwrap().base_mut().is_start = true;
    g
}

#[tokio::test]
async fn decision_branch_offers_then_follows_selected_action() {
    let engine = engine_with(decision_branch_graph());

    let first = engine
        .step(StepRequest { graph_id: "AUTH_decision".to_string(), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(first.response.actions.len(), 2);
    assert!(first.response.actions.iter().any(|a| a.next_node == "end_pwd"));
    assert!(first.response.actions.iter().any(|a| a.next_node == "end_otp"));

    let second = engine
        .step(StepRequest {
            flow_id: Some(first.flow_id.clone()),
            current_action: "end_otp".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(second.response.status, Some(flowcraft::context::NodeStatus::Complete));
    assert!(engine.context_store().get(&first.flow_id).unwrap().is_none());
}

/// Start -> Task(FlakyAuth, onFailure=err_prompt) -> err_prompt | End, per
/// spec scenario 3.
fn onfailure_recovery_graph() -> Graph {
    let mut g = Graph::new("AUTH_onfailure", FlowType::Authentication);
    g.add_node(rep("start", "START", Some("task")));

    let mut task = Factory::create_node("task", "TASK_EXECUTION", Default::default(), false, false).unwrap();
    Factory::bind_executor(&mut task, "FlakyAuth", Arc::new(common::FlakyAuthExecutor));
    if let Node::TaskExecution(t) = &mut task {
        t.on_success = Some("end".to_string());
        t.on_failure = Some("err_prompt".to_string());
    }
    g.add_node(task);

    let err_prompt = Node::Prompt(flowcraft::node::PromptNode {
        base: NodeBase::new("err_prompt", "PROMPT"),
        prompts: vec![flowcraft::node::Prompt {
            inputs: vec![flowcraft::context::Input {
                ref_: "retry_ref".to_string(),
                identifier: "retryCode".to_string(),
                input_type: "text".to_string(),
                required: true,
                options: None,
            }],
            action: Some(Action { ref_: "retry".to_string(), next_node: "task".to_string() }),
        }],
        meta: None,
    });
    g.add_node(err_prompt);

    g.add_node(rep("end", "END", None));
    g.node_mut("end").unwrap().base_mut().is_final = true;

    g.add_edge("start", "task").unwrap();
    g.add_edge("task", "end").unwrap();
    g.add_edge("task", "err_prompt").unwrap();
    g.add_edge("err_prompt", "task").unwrap();

    g.set_start_node("start");
    g.node_mut("start").unwrap().base_mut().is_start = true;
    g
}

#[tokio::test]
async fn on_failure_forwards_to_prompt_then_clears_on_retry() {
    let engine = engine_with(onfailure_recovery_graph());

    let first = engine
        .step(StepRequest { graph_id: "AUTH_onfailure".to_string(), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(first.response.failure_reason, "AUTH_FAILED");
    assert_eq!(first.response.inputs.len(), 1);

    let second = engine
        .step(StepRequest { flow_id: Some(first.flow_id.clone()), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(second.response.failure_reason, "");
}

/// Start -> Task(gated by a condition) -> NormalEnd | SkipEnd, per spec
/// scenario 4. The gated task has no bound executor at all, so the test
/// fails loudly if the condition-skip path ever stops short-circuiting.
fn condition_skip_graph() -> Graph {
    let mut g = Graph::new("AUTH_condition", FlowType::Authentication);
    g.add_node(rep("start", "START", Some("gate")));

    let mut gate = Factory::create_node("gate", "TASK_EXECUTION", Default::default(), false, false).unwrap();
    gate.base_mut().condition = Some(NodeCondition {
        key: "{{ context.userType }}".to_string(),
        value: "Customer".to_string(),
        on_skip: "skip_end".to_string(),
    });
    if let Node::TaskExecution(t) = &mut gate {
        t.on_success = Some("normal_end".to_string());
    }
    g.add_node(gate);

    g.add_node(rep("normal_end", "END", None));
    g.add_node(rep("skip_end", "END", None));
    g.node_mut("normal_end").unwrap().base_mut().is_final = true;
    g.node_mut("skip_end").unwrap().base_mut().is_final = true;

    g.add_edge("start", "gate").unwrap();
    g.add_edge("gate", "normal_end").unwrap();

    g.set_start_node("start");
    g.node_mut("start").unwrap().base_mut().is_start = true;
    g
}

#[tokio::test]
async fn unmet_condition_skips_to_on_skip_target() {
    let engine = engine_with(condition_skip_graph());

    let mut user_inputs = HashMap::new();
    user_inputs.insert("userType".to_string(), "Employee".to_string());

    let outcome = engine
        .step(StepRequest { graph_id: "AUTH_condition".to_string(), user_inputs, ..Default::default() })
        .await
        .unwrap();

    assert_eq!(outcome.response.status, Some(flowcraft::context::NodeStatus::Complete));
    assert!(engine.context_store().get(&outcome.flow_id).unwrap().is_none());
}
