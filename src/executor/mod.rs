//! The executor contract, required-input negotiation, and the registry
//! that resolves executor names loaded from flow definitions.
//!
//! An [`Executor`] is the polymorphic unit of work bound to a
//! task-execution node: authentication, OTP send/verify, provisioning, and
//! user-type resolution are all external implementations of this trait.
//! Only the contract lives here — concrete authenticators/provisioners are
//! out of scope for this crate, save for the thin built-ins in
//! [`builtin`] that exist so the loader's default-executor rules and the
//! registration-synthesis rules have something real to bind.

pub mod builtin;
pub mod registry;

pub use registry::{ExecutorRegistry, ExecutorRegistryBuilder};

use async_trait::async_trait;

use crate::context::{ExecutorResponse, ExecutorStatus, Input, NodeContext};

/// The pluggable unit of work a task-execution node delegates to.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run this executor's unit of work against the current flow context.
    async fn execute(&self, ctx: &mut NodeContext) -> crate::Result<ExecutorResponse>;

    /// The name this executor is registered under.
    fn name(&self) -> &str;

    /// A coarse category for this executor (e.g. `"authenticator"`,
    /// `"provisioner"`). Purely descriptive; the engine never branches on it.
    fn executor_type(&self) -> &str;

    /// Inputs required when the node binding this executor declares none
    /// of its own.
    fn default_inputs(&self) -> Vec<Input> {
        Vec::new()
    }

    /// Prerequisite context keys that must already be resolved before this
    /// executor can run (e.g. `"userID"`).
    fn prerequisites(&self) -> Vec<String> {
        Vec::new()
    }

    /// Resolve the current user id from context, if any is already known.
    fn user_id_from_context(&self, ctx: &NodeContext) -> Option<String> {
        if ctx.authenticated_user.user_id.is_empty() {
            None
        } else {
            Some(ctx.authenticated_user.user_id.clone())
        }
    }

    /// The effective required-input list for this tick: the node's own
    /// declared inputs take precedence over this executor's defaults.
    fn required_inputs(&self, ctx: &NodeContext) -> Vec<Input> {
        if ctx.node_inputs.is_empty() {
            self.default_inputs()
        } else {
            ctx.node_inputs.clone()
        }
    }

    /// Negotiate required inputs against what the caller has already
    /// supplied. Missing inputs are appended to `response.inputs`; returns
    /// `true` only if every *required* input in the effective list is
    /// already satisfied (optional missing inputs are reported but do not
    /// block).
    fn has_required_inputs(&self, ctx: &NodeContext, response: &mut ExecutorResponse) -> bool {
        let mut satisfied_all_required = true;

        for input in self.required_inputs(ctx) {
            let satisfied = ctx.user_inputs.contains_key(&input.identifier)
                || ctx.runtime_data.contains_key(&input.identifier);

            if !satisfied {
                if input.required {
                    satisfied_all_required = false;
                }
                response.inputs.push(input);
            }
        }

        satisfied_all_required
    }

    /// Validate this executor's prerequisites against context. On failure,
    /// sets `response.status = Failure` with a machine-readable reason and
    /// returns `false`.
    fn validate_prerequisites(&self, ctx: &NodeContext, response: &mut ExecutorResponse) -> bool {
        for name in self.prerequisites() {
            let satisfied = if name == "userID" {
                !ctx.authenticated_user.user_id.is_empty()
            } else {
                ctx.user_inputs.contains_key(&name) || ctx.runtime_data.contains_key(&name)
            };

            if !satisfied {
                response.status = Some(ExecutorStatus::Failure);
                response.failure_reason = format!("Prerequisite not met: {name}");
                return false;
            }
        }
        true
    }
}
