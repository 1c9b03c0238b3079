//! Actions on elements located by [`crate::extraction::deep`].
//!
//! Handles are only valid on the page that produced them; search again after
//! anything that may have navigated.

use crate::error::ScrapeError;
use crate::extraction::deep::DeepNode;
use crate::renderer::RenderContext;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// In-page dispatcher; takes a serialized [`ActionRequest`].
pub(crate) const NODE_ACTION_JS: &str = include_str!("../extraction/scripts/node_action.js");

/// What to do with a located element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeAction {
    Click,
    /// Click the enclosing element, crossing out of a shadow root if needed.
    ClickParent,
    /// Replace the value of an input and fire `input`/`change`.
    Fill(String),
}

impl NodeAction {
    fn kind(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::ClickParent => "click_parent",
            Self::Fill(_) => "fill",
        }
    }
}

/// Wire form of an action, as the page script reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ActionRequest {
    pub handle: u32,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ActionRequest {
    fn new(node: &DeepNode, action: &NodeAction) -> Self {
        Self {
            handle: node.handle,
            kind: action.kind().to_string(),
            value: match action {
                NodeAction::Fill(value) => Some(value.clone()),
                _ => None,
            },
        }
    }

    pub(crate) fn to_script(&self) -> Result<String, ScrapeError> {
        let json = serde_json::to_string(self).map_err(|e| ScrapeError::Script {
            what: format!("encoding {} action", self.kind),
            detail: e.to_string(),
        })?;
        Ok(format!("({NODE_ACTION_JS})({json})"))
    }

    #[cfg(test)]
    pub(crate) fn from_script(script: &str) -> Option<Self> {
        let json = script
            .strip_prefix(&format!("({NODE_ACTION_JS})("))?
            .strip_suffix(')')?;
        serde_json::from_str(json).ok()
    }
}

#[derive(Debug, Deserialize)]
struct ActionOutcome {
    ok: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// Perform `action` on `node`.
pub async fn perform(
    ctx: &dyn RenderContext,
    node: &DeepNode,
    action: &NodeAction,
) -> Result<(), ScrapeError> {
    let what = format!("{} on <{}> {:?}", action.kind(), node.tag, node.own_text);
    let script = ActionRequest::new(node, action).to_script()?;
    let value = ctx.execute_js(&script).await.map_err(ScrapeError::browser)?;
    let outcome: ActionOutcome = serde_json::from_value(value).map_err(|e| ScrapeError::Script {
        what: what.clone(),
        detail: format!("unexpected result: {e}"),
    })?;
    if !outcome.ok {
        return Err(ScrapeError::Script {
            what,
            detail: outcome.reason.unwrap_or_else(|| "rejected".to_string()),
        });
    }
    // the filled value may be a secret; log only the target
    debug!(action = action.kind(), tag = %node.tag, handle = node.handle, "action performed");
    Ok(())
}

pub async fn deep_click(ctx: &dyn RenderContext, node: &DeepNode) -> Result<(), ScrapeError> {
    perform(ctx, node, &NodeAction::Click).await
}

pub async fn deep_click_parent(
    ctx: &dyn RenderContext,
    node: &DeepNode,
) -> Result<(), ScrapeError> {
    perform(ctx, node, &NodeAction::ClickParent).await
}

pub async fn deep_fill(
    ctx: &dyn RenderContext,
    node: &DeepNode,
    value: &str,
) -> Result<(), ScrapeError> {
    perform(ctx, node, &NodeAction::Fill(value.to_string())).await
}
