//! Placeholder template resolution (`{{ context.key }}`).
//!
//! `{{ context.KEY }}` is the only template syntax the engine understands.
//! Any future lookup source (e.g. `user.KEY`, `env.KEY`) is an additive
//! extension with its own well-defined ordering — see spec design notes.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::NodeContext;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*context\s*\.\s*(\w+)\s*\}\}").expect("valid regex"));

/// Resolve every `{{ context.KEY }}` occurrence in `template` against `ctx`.
///
/// A `None` context returns `template` unchanged. A key that cannot be
/// resolved from any source leaves its placeholder verbatim in the output,
/// whitespace and all (the match, not a normalized form, is preserved).
pub fn resolve(ctx: Option<&NodeContext>, template: &str) -> String {
    let Some(ctx) = ctx else {
        return template.to_string();
    };

    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures| {
            let whole = caps.get(0).unwrap().as_str();
            let key = &caps[1];
            resolve_key(ctx, key).unwrap_or_else(|| whole.to_string())
        })
        .into_owned()
}

fn resolve_key(ctx: &NodeContext, key: &str) -> Option<String> {
    if key == "userID" {
        return non_empty(&ctx.authenticated_user.user_id)
            .or_else(|| ctx.runtime_data.get("userID").and_then(|v| non_empty(v)));
    }

    ctx.runtime_data
        .get(key)
        .and_then(|v| non_empty(v))
        .or_else(|| ctx.user_inputs.get(key).and_then(|v| non_empty(v)))
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
