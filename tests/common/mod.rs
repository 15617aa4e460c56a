//! Shared fixtures for the integration tests: a scratch definitions
//! directory and a couple of test-only executors standing in for real
//! authenticators.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use flowcraft::context::{AuthenticatedUser, ExecutorResponse, ExecutorStatus, NodeContext};
use flowcraft::executor::builtin::{AuthAssertExecutor, ProvisioningExecutor, UserTypeResolverExecutor};
use flowcraft::executor::{Executor, ExecutorRegistry};

static NEXT_DIR: AtomicU64 = AtomicU64::new(0);

/// A fresh, empty scratch directory under the system temp dir, unique per
/// call within a test run.
pub fn scratch_dir(label: &str) -> PathBuf {
    let n = NEXT_DIR.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("flowcraft-it-{label}-{}-{n}", std::process::id()));
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

/// Write `contents` to `dir/name`.
pub fn write_fixture(dir: &std::path::Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write fixture file");
}

/// Completes with a fixed user id once both `username` and `password` are
/// present; otherwise asks for them.
pub struct BasicAuthExecutor;

#[async_trait]
impl Executor for BasicAuthExecutor {
    async fn execute(&self, ctx: &mut NodeContext) -> flowcraft::Result<ExecutorResponse> {
        if ctx.user_inputs.contains_key("username") && ctx.user_inputs.contains_key("password") {
            Ok(ExecutorResponse {
                status: Some(ExecutorStatus::Complete),
                authenticated_user: Some(AuthenticatedUser {
                    user_id: "42".to_string(),
                    is_authenticated: true,
                    ..Default::default()
                }),
                ..Default::default()
            })
        } else {
            Ok(ExecutorResponse { status: Some(ExecutorStatus::UserInputRequired), ..Default::default() })
        }
    }

    fn name(&self) -> &str {
        "BasicAuth"
    }

    fn executor_type(&self) -> &str {
        "authenticator"
    }
}

/// Always fails with a fixed machine-readable reason. Stands in for an
/// authenticator that has rejected the caller's credentials.
pub struct FlakyAuthExecutor;

#[async_trait]
impl Executor for FlakyAuthExecutor {
    async fn execute(&self, _ctx: &mut NodeContext) -> flowcraft::Result<ExecutorResponse> {
        Ok(ExecutorResponse {
            status: Some(ExecutorStatus::Failure),
            failure_reason: "AUTH_FAILED".to_string(),
            ..Default::default()
        })
    }

    fn name(&self) -> &str {
        "FlakyAuth"
    }

    fn executor_type(&self) -> &str {
        "authenticator"
    }
}

/// A registry carrying the built-ins plus the two test authenticators
/// above — enough to load and run every fixture graph in this directory.
pub fn test_registry() -> ExecutorRegistry {
    ExecutorRegistry::builder()
        .register(std::sync::Arc::new(BasicAuthExecutor))
        .register(std::sync::Arc::new(FlakyAuthExecutor))
        .register(std::sync::Arc::new(AuthAssertExecutor::new()))
        .register(std::sync::Arc::new(UserTypeResolverExecutor::new()))
        .register(std::sync::Arc::new(ProvisioningExecutor::new()))
        .build()
}
