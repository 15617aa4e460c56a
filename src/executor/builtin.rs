//! Minimal, contract-complete built-in executors.
//!
//! These exist so the loader's default-executor-assignment rules and
//! registration-synthesis rules (which name `AuthAssert`,
//! `UserTypeResolver`, and `Provisioning` specifically) have something
//! real to resolve, and so integration tests can drive a full flow without
//! supplying bespoke authenticators. They are intentionally thin: real
//! authentication/provisioning logic is out of scope for this crate.

use async_trait::async_trait;

use crate::context::{AuthenticatedUser, ExecutorResponse, ExecutorStatus, NodeContext};

/// Resolves whether the current user is a `"Customer"` or other type,
/// writing it to `runtimeData["userType"]`. Spliced after the start node
/// by registration synthesis when no other node already uses it.
pub struct UserTypeResolverExecutor;

impl UserTypeResolverExecutor {
    /// Construct the resolver.
    pub fn new() -> Self {
        Self
    }
}

impl Default for UserTypeResolverExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl super::Executor for UserTypeResolverExecutor {
    async fn execute(&self, ctx: &mut NodeContext) -> crate::Result<ExecutorResponse> {
        let user_type = ctx
            .user_inputs
            .get("userType")
            .cloned()
            .unwrap_or_else(|| "Customer".to_string());

        let mut runtime_data = ctx.runtime_data.clone();
        runtime_data.insert("userType".to_string(), user_type);

        Ok(ExecutorResponse {
            status: Some(ExecutorStatus::Complete),
            runtime_data,
            ..Default::default()
        })
    }

    fn name(&self) -> &str {
        "UserTypeResolver"
    }

    fn executor_type(&self) -> &str {
        "resolver"
    }
}

/// Asserts that the flow has already authenticated a user (typically
/// bound to an `AUTH_SUCCESS` node) and surfaces the resolved principal.
pub struct AuthAssertExecutor;

impl AuthAssertExecutor {
    /// Construct the executor.
    pub fn new() -> Self {
        Self
    }
}

impl Default for AuthAssertExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl super::Executor for AuthAssertExecutor {
    async fn execute(&self, ctx: &mut NodeContext) -> crate::Result<ExecutorResponse> {
        if !ctx.authenticated_user.is_authenticated {
            return Ok(ExecutorResponse {
                status: Some(ExecutorStatus::Failure),
                failure_reason: "User is not authenticated".to_string(),
                ..Default::default()
            });
        }

        Ok(ExecutorResponse {
            status: Some(ExecutorStatus::Complete),
            authenticated_user: Some(ctx.authenticated_user.clone()),
            assertion: Some(format!("assert:{}", ctx.authenticated_user.user_id)),
            ..Default::default()
        })
    }

    fn name(&self) -> &str {
        "AuthAssert"
    }

    fn executor_type(&self) -> &str {
        "assertion"
    }

    fn prerequisites(&self) -> Vec<String> {
        vec!["userID".to_string()]
    }
}

/// Marks the user as provisioned. Spliced in before the terminal node by
/// registration synthesis.
pub struct ProvisioningExecutor;

impl ProvisioningExecutor {
    /// Construct the executor.
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProvisioningExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl super::Executor for ProvisioningExecutor {
    async fn execute(&self, ctx: &mut NodeContext) -> crate::Result<ExecutorResponse> {
        let mut runtime_data = ctx.runtime_data.clone();
        runtime_data.insert("provisioned".to_string(), "true".to_string());

        let authenticated_user = AuthenticatedUser {
            is_authenticated: true,
            ..ctx.authenticated_user.clone()
        };

        Ok(ExecutorResponse {
            status: Some(ExecutorStatus::Complete),
            runtime_data,
            authenticated_user: Some(authenticated_user),
            ..Default::default()
        })
    }

    fn name(&self) -> &str {
        "Provisioning"
    }

    fn executor_type(&self) -> &str {
        "provisioner"
    }
}
