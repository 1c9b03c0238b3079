//! Shadow-piercing element search.
//!
//! Path expressions stop at shadow-root boundaries, so every lookup here is a
//! structural walk run inside the page: visit each element of a root, test it
//! against a [`NodeQuery`], and descend into its `shadowRoot` if it has one.
//! Matches are registered in the page and come back as [`DeepNode`]s whose
//! handles the actions in [`crate::live::act`] accept.

use crate::error::ScrapeError;
use crate::renderer::RenderContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// In-page walker; takes a serialized [`NodeQuery`].
pub(crate) const DEEP_SEARCH_JS: &str = include_str!("scripts/deep_search.js");

/// How a node's text is compared with [`NodeQuery::text`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMatch {
    #[default]
    Contains,
    Exact,
}

/// Which text of a node is compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextScope {
    /// The node's own text nodes only.
    Own,
    /// All descendant text.
    #[default]
    All,
}

/// A predicate over elements, evaluated inside the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeQuery {
    /// CSS selector the element itself must match.
    pub selector: Option<String>,
    /// Allowed tag names (lowercase); empty allows any.
    pub tags: Vec<String>,
    pub text: Option<String>,
    pub text_match: TextMatch,
    pub text_scope: TextScope,
    pub case_sensitive: bool,
    /// Only leaves, buttons and links.
    pub clickable_leaf: bool,
    pub visible_only: bool,
    /// Stop after this many matches.
    pub limit: usize,
}

impl Default for NodeQuery {
    fn default() -> Self {
        Self {
            selector: None,
            tags: Vec::new(),
            text: None,
            text_match: TextMatch::Contains,
            text_scope: TextScope::All,
            case_sensitive: true,
            clickable_leaf: false,
            visible_only: false,
            limit: 1,
        }
    }
}

impl NodeQuery {
    /// Elements matching a CSS selector.
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            selector: Some(selector.into()),
            ..Self::default()
        }
    }

    /// Elements whose text contains `text`.
    pub fn containing(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Elements whose whole text equals `text`.
    pub fn labelled(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            text_match: TextMatch::Exact,
            ..Self::default()
        }
    }

    pub fn own_text(mut self) -> Self {
        self.text_scope = TextScope::Own;
        self
    }

    pub fn ignore_case(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_ascii_lowercase()).collect();
        self
    }

    pub fn clickable_leaf(mut self) -> Self {
        self.clickable_leaf = true;
        self
    }

    pub fn visible(mut self) -> Self {
        self.visible_only = true;
        self
    }

    /// The page expression that runs this query.
    pub fn to_script(&self) -> Result<String, ScrapeError> {
        let json = serde_json::to_string(self).map_err(|e| ScrapeError::Script {
            what: self.to_string(),
            detail: e.to_string(),
        })?;
        Ok(format!("({DEEP_SEARCH_JS})({json})"))
    }

    /// Inverse of [`NodeQuery::to_script`].
    #[cfg(test)]
    pub(crate) fn from_script(script: &str) -> Option<Self> {
        let json = script
            .strip_prefix(&format!("({DEEP_SEARCH_JS})("))?
            .strip_suffix(')')?;
        serde_json::from_str(json).ok()
    }
}

impl fmt::Display for NodeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags = if self.tags.is_empty() {
            "element".to_string()
        } else {
            format!("<{}>", self.tags.join("|"))
        };
        write!(f, "{tags}")?;
        if let Some(sel) = &self.selector {
            write!(f, " matching {sel:?}")?;
        }
        if let Some(text) = &self.text {
            let how = match self.text_match {
                TextMatch::Contains => "containing",
                TextMatch::Exact => "labelled",
            };
            write!(f, " {how} {text:?}")?;
        }
        if self.visible_only {
            write!(f, " (visible)")?;
        }
        Ok(())
    }
}

/// A matched element, as reported by the walker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepNode {
    /// Registry slot for follow-up actions; invalid after navigation.
    pub handle: u32,
    pub tag: String,
    /// Whitespace-collapsed `textContent`.
    pub text: String,
    pub own_text: String,
    pub inner_text: String,
    pub parent_text: Option<String>,
    pub next_sibling_text: Option<String>,
    pub visible: bool,
    /// Number of shadow boundaries crossed to reach it.
    pub depth: u32,
}

/// Every element in the document, shadow trees included, that satisfies
/// `query`, in document order.
pub async fn deep_search(
    ctx: &dyn RenderContext,
    query: &NodeQuery,
) -> Result<Vec<DeepNode>, ScrapeError> {
    let value = ctx
        .execute_js(&query.to_script()?)
        .await
        .map_err(ScrapeError::browser)?;
    let nodes: Vec<DeepNode> =
        serde_json::from_value(value).map_err(|e| ScrapeError::Script {
            what: format!("searching for {query}"),
            detail: format!("unexpected result: {e}"),
        })?;
    debug!(query = %query, matches = nodes.len(), "deep search");
    Ok(nodes)
}

/// First match of `query`, if any.
pub async fn deep_first(
    ctx: &dyn RenderContext,
    query: &NodeQuery,
) -> Result<Option<DeepNode>, ScrapeError> {
    Ok(deep_search(ctx, query).await?.into_iter().next())
}
