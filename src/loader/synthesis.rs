//! Registration graph synthesis (§4.8): derive a registration graph from
//! an authentication graph by structural rewriting. Purely structural —
//! nothing executes during synthesis.

use std::sync::Arc;

use crate::context::FlowType;
use crate::executor::builtin::{ProvisioningExecutor, UserTypeResolverExecutor};
use crate::graph::{Factory, Graph, GraphError};
use crate::node::Node;

const PROVISIONING_NODE_ID: &str = "__synthesized_provisioning";
const USER_TYPE_RESOLVER_NODE_ID: &str = "__synthesized_user_type_resolver";

/// Clone `auth_graph` into a new registration graph under `registration_id`,
/// then splice in a provisioning step before the terminal node and a
/// `UserTypeResolver` step after the start node (unless one is already
/// present).
pub fn synthesize_registration_graph(auth_graph: &Graph, registration_id: &str) -> Result<Graph, GraphError> {
    let cloned_nodes = Factory::clone_nodes(&auth_graph.nodes)?;

    let mut graph = Graph {
        id: registration_id.to_string(),
        graph_type: FlowType::Registration,
        nodes: cloned_nodes,
        adjacency: auth_graph.adjacency.clone(),
        reverse_adjacency: auth_graph.reverse_adjacency.clone(),
        start_node_id: auth_graph.start_node_id.clone(),
    };

    splice_provisioning(&mut graph)?;
    splice_user_type_resolver(&mut graph)?;

    Ok(graph)
}

fn splice_provisioning(graph: &mut Graph) -> Result<(), GraphError> {
    let terminal_id = graph
        .nodes
        .values()
        .find(|n| n.is_final())
        .map(|n| n.id().to_string())
        .ok_or(GraphError::NoTerminalNode)?;

    let incoming: Vec<String> = graph.reverse_adjacency.get(&terminal_id).cloned().unwrap_or_default();

    let mut provisioning = Factory::create_node(
        PROVISIONING_NODE_ID,
        "TASK_EXECUTION",
        Default::default(),
        false,
        false,
    )?;
    Factory::bind_executor(&mut provisioning, "Provisioning", Arc::new(ProvisioningExecutor::new()));
    if let Node::TaskExecution(t) = &mut provisioning {
        t.on_success = Some(terminal_id.clone());
    }
    graph.add_node(provisioning);

    for predecessor in incoming {
        graph.remove_edge(&predecessor, &terminal_id);
        graph.add_edge(&predecessor, PROVISIONING_NODE_ID)?;
        if let Some(Node::TaskExecution(t)) = graph.node_mut(&predecessor) {
            if t.on_success.as_deref() == Some(terminal_id.as_str()) {
                t.on_success = Some(PROVISIONING_NODE_ID.to_string());
            }
        }
        if let Some(Node::Representation(r)) = graph.node_mut(&predecessor) {
            if r.on_success.as_deref() == Some(terminal_id.as_str()) {
                r.on_success = Some(PROVISIONING_NODE_ID.to_string());
            }
        }
        if let Some(Node::Prompt(p)) = graph.node_mut(&predecessor) {
            for prompt in &mut p.prompts {
                if let Some(action) = &mut prompt.action {
                    if action.next_node == terminal_id {
                        action.next_node = PROVISIONING_NODE_ID.to_string();
                    }
                }
            }
        }
    }

    graph.add_edge(PROVISIONING_NODE_ID, &terminal_id)?;

    graph.node_mut(&terminal_id).expect("terminal id came from this graph").base_mut().is_final = true;
    graph.node_mut(PROVISIONING_NODE_ID).expect("just inserted").base_mut().is_final = false;

    Ok(())
}

fn splice_user_type_resolver(graph: &mut Graph) -> Result<(), GraphError> {
    let already_present = graph.nodes.values().any(|n| match n {
        Node::TaskExecution(t) => t.executor_name == "UserTypeResolver",
        _ => false,
    });
    if already_present {
        return Ok(());
    }

    let start_id = match &graph.start_node_id {
        Some(id) => id.clone(),
        None => return Err(GraphError::NoStartNode),
    };

    let successors = graph.adjacency.get(&start_id).cloned().unwrap_or_default();

    let mut resolver = Factory::create_node(
        USER_TYPE_RESOLVER_NODE_ID,
        "TASK_EXECUTION",
        Default::default(),
        false,
        false,
    )?;
    Factory::bind_executor(&mut resolver, "UserTypeResolver", Arc::new(UserTypeResolverExecutor::new()));
    graph.add_node(resolver);

    for successor in &successors {
        graph.remove_edge(&start_id, successor);
    }
    graph.add_edge(&start_id, USER_TYPE_RESOLVER_NODE_ID)?;
    if let Some(Node::Representation(r)) = graph.node_mut(&start_id) {
        r.on_success = Some(USER_TYPE_RESOLVER_NODE_ID.to_string());
    }

    for successor in &successors {
        graph.add_edge(USER_TYPE_RESOLVER_NODE_ID, successor)?;
    }
    if let Some(Node::TaskExecution(t)) = graph.node_mut(USER_TYPE_RESOLVER_NODE_ID) {
        t.on_success = successors.first().cloned();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Factory as F;
    use crate::node::NodeBase;

    fn rep(id: &str, node_type: &str) -> Node {
        use crate::node::RepresentationNode;
        Node::Representation(RepresentationNode { base: NodeBase::new(id, node_type), on_success: None })
    }

    fn simple_auth_graph() -> Graph {
        let mut g = Graph::new("AUTH_default", FlowType::Authentication);
        g.add_node(rep("start", "START"));
        g.add_node(rep("end", "END"));
        g.node_mut("end").unwrap().base_mut().is_final = true;
        g.add_edge("start", "end").unwrap();
        g.set_start_node("start");
        if let Node::Representation(r) = g.node_mut("start").unwrap() {
            r.on_success = Some("end".to_string());
        }
        g
    }

    #[test]
    fn synthesis_inserts_provisioning_before_terminal() {
        let auth = simple_auth_graph();
        let reg = synthesize_registration_graph(&auth, "REGISTRATION_default").unwrap();

        assert!(reg.nodes.contains_key(PROVISIONING_NODE_ID));
        assert_eq!(reg.adjacency.get(PROVISIONING_NODE_ID).unwrap(), &vec!["end".to_string()]);
        assert!(!reg.reverse_adjacency.get("end").unwrap().iter().any(|p| p == "start"));
        assert!(reg.reverse_adjacency.get("end").unwrap().iter().any(|p| p == PROVISIONING_NODE_ID));
    }

    #[test]
    fn synthesis_rewrites_prompt_action_pointing_at_terminal() {
        use crate::context::Action;
        use crate::node::{Prompt, PromptNode};

        let mut auth = Graph::new("AUTH_default", FlowType::Authentication);
        auth.add_node(rep("start", "START"));
        auth.add_node(Node::Prompt(PromptNode {
            base: NodeBase::new("confirm", "PROMPT"),
            prompts: vec![Prompt {
                inputs: vec![],
                action: Some(Action { ref_: "confirm".to_string(), next_node: "end".to_string() }),
            }],
            meta: None,
        }));
        auth.add_node(rep("end", "END"));
        auth.node_mut("end").unwrap().base_mut().is_final = true;
        auth.add_edge("start", "confirm").unwrap();
        auth.add_edge("confirm", "end").unwrap();
        auth.set_start_node("start");
        if let Node::Representation(r) = auth.node_mut("start").unwrap() {
            r.on_success = Some("confirm".to_string());
        }

        let reg = synthesize_registration_graph(&auth, "REGISTRATION_default").unwrap();

        let Node::Prompt(confirm) = reg.node("confirm").unwrap() else { panic!("expected prompt node") };
        assert_eq!(confirm.prompts[0].action.as_ref().unwrap().next_node, PROVISIONING_NODE_ID);
    }

    #[test]
    fn synthesis_splices_user_type_resolver_after_start() {
        let auth = simple_auth_graph();
        let reg = synthesize_registration_graph(&auth, "REGISTRATION_default").unwrap();

        assert!(reg.nodes.contains_key(USER_TYPE_RESOLVER_NODE_ID));
        assert_eq!(reg.adjacency.get("start").unwrap(), &vec![USER_TYPE_RESOLVER_NODE_ID.to_string()]);
        assert_eq!(reg.start_node_id, Some("start".to_string()));
    }

    #[test]
    fn synthesis_skips_resolver_when_already_present() {
        let mut auth = simple_auth_graph();
        let mut resolver = F::create_node("existing_resolver", "TASK_EXECUTION", Default::default(), false, false)
            .unwrap();
        F::bind_executor(&mut resolver, "UserTypeResolver", Arc::new(UserTypeResolverExecutor::new()));
        auth.add_node(resolver);
        auth.remove_edge("start", "end");
        auth.add_edge("start", "existing_resolver").unwrap();
        auth.add_edge("existing_resolver", "end").unwrap();
        if let Node::Representation(r) = auth.node_mut("start").unwrap() {
            r.on_success = Some("existing_resolver".to_string());
        }

        let reg = synthesize_registration_graph(&auth, "REGISTRATION_default").unwrap();
        assert!(!reg.nodes.contains_key(USER_TYPE_RESOLVER_NODE_ID));
    }
}
