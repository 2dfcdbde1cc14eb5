//! Registry of enabled tools and call dispatch.

use crate::context::ToolContext;
use crate::handlers::{self, Reply};
use crate::invocation::ToolInvocation;
use crate::kind::{ToolKind, ToolSpec};
use log::{debug, warn};
use mnemos_config::ToolPolicy;
use mnemos_protocol::{ToolCall, ToolCallId, ToolError};
use serde_json::Value;

/// Result of one dispatched tool call, ready to become a tool message.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    /// Call id the result answers.
    pub call_id: ToolCallId,
    /// Tool name as requested.
    pub name: String,
    /// Text returned to the model.
    pub content: String,
    /// Whether the call took effect.
    pub success: bool,
}

/// The enabled subset of the tool set after applying a policy.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    enabled: Vec<ToolKind>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self {
            enabled: ToolKind::ALL.to_vec(),
        }
    }
}

impl ToolRegistry {
    /// Registry with every tool enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry filtered by an allow/deny policy.
    pub fn with_policy(policy: &ToolPolicy) -> Self {
        let enabled: Vec<ToolKind> = ToolKind::ALL
            .into_iter()
            .filter(|kind| policy.permits(kind.name()))
            .collect();
        debug!(
            "tool registry built (enabled={:?})",
            enabled.iter().map(ToolKind::name).collect::<Vec<_>>()
        );
        Self { enabled }
    }

    /// Whether a kind is enabled.
    pub fn is_enabled(&self, kind: ToolKind) -> bool {
        self.enabled.contains(&kind)
    }

    /// List enabled tool names.
    pub fn list(&self) -> Vec<&'static str> {
        self.enabled.iter().map(ToolKind::name).collect()
    }

    /// Return specs for all enabled tools.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.enabled.iter().map(ToolKind::spec).collect()
    }

    /// Resolve a call name and parse its arguments.
    pub fn resolve(&self, call: &ToolCall) -> Result<ToolInvocation, ToolError> {
        let kind = ToolKind::from_name(&call.name)
            .filter(|kind| self.is_enabled(*kind))
            .ok_or_else(|| ToolError::ToolNotFound(call.name.clone()))?;
        ToolInvocation::parse_kind(kind, &call.arguments)
    }

    /// Parse and run a call.
    ///
    /// Argument, lookup and execution failures come back as an in-band
    /// `"Error: ..."` outcome. Only infrastructure failures are returned as
    /// `Err`.
    pub async fn dispatch(&self, ctx: &ToolContext, call: &ToolCall) -> Result<ToolOutcome, ToolError> {
        let result = match self.resolve(call) {
            Ok(invocation) => handlers::run(ctx, invocation).await,
            Err(err) => Err(err),
        };
        let (content, success) = match result {
            Ok(Reply::Value(value)) => (render(value), true),
            Ok(Reply::Rejected(message)) => (message, false),
            Err(err) if err.is_infrastructure() => {
                warn!(
                    "tool call hit infrastructure failure (tool={}, call_id={}, error={})",
                    call.name, call.id, err
                );
                return Err(err);
            }
            Err(err) => {
                debug!(
                    "tool call failed in-band (tool={}, call_id={}, error={})",
                    call.name, call.id, err
                );
                (format!("Error: {err}"), false)
            }
        };
        Ok(ToolOutcome {
            call_id: call.id.clone(),
            name: call.name.clone(),
            content,
            success,
        })
    }
}

/// Strings pass through verbatim; everything else is compact JSON.
fn render(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}
