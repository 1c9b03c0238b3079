//! A scripted page for driving the scrape flow without a browser.
//!
//! The fake answers the same serialized queries and actions the real walker
//! scripts receive, against a flat list of nodes. A node can be gated behind
//! a click on another node and can take a few polls to appear, which is
//! enough to model the portal's lazy rendering.

use super::{NavigationResult, RenderContext, Renderer};
use crate::extraction::deep::{DeepNode, NodeQuery, TextMatch, TextScope};
use crate::live::act::ActionRequest;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-viewport";

#[derive(Debug, Clone)]
pub struct FakeNode {
    pub name: String,
    pub tag: String,
    pub selectors: Vec<String>,
    pub own_text: String,
    pub text: String,
    pub parent_text: Option<String>,
    pub next_sibling_text: Option<String>,
    pub leaf: bool,
    pub visible: bool,
    pub depth: u32,
    /// Node whose click reveals this one.
    pub gate: Option<String>,
    /// Searches after the gate opens before this node shows up.
    pub delay: u64,
}

impl FakeNode {
    pub fn new(name: &str, tag: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            tag: tag.to_string(),
            selectors: Vec::new(),
            own_text: text.to_string(),
            text: text.to_string(),
            parent_text: None,
            next_sibling_text: None,
            leaf: true,
            visible: true,
            depth: 1,
            gate: None,
            delay: 0,
        }
    }

    pub fn selector(mut self, selector: &str) -> Self {
        self.selectors.push(selector.to_string());
        self
    }

    pub fn parent_text(mut self, text: &str) -> Self {
        self.parent_text = Some(text.to_string());
        self
    }

    pub fn next_sibling(mut self, text: &str) -> Self {
        self.next_sibling_text = Some(text.to_string());
        self
    }

    pub fn after(mut self, gate: &str) -> Self {
        self.gate = Some(gate.to_string());
        self
    }

    pub fn delay(mut self, searches: u64) -> Self {
        self.delay = searches;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    fn takes_input(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "textarea")
    }

    fn matches(&self, q: &NodeQuery) -> bool {
        if let Some(sel) = &q.selector {
            if !self.selectors.contains(sel) {
                return false;
            }
        }
        if !q.tags.is_empty() && !q.tags.contains(&self.tag) {
            return false;
        }
        if let Some(needle) = &q.text {
            let hay = match q.text_scope {
                TextScope::Own => &self.own_text,
                TextScope::All => &self.text,
            };
            let (hay, needle) = if q.case_sensitive {
                (hay.clone(), needle.clone())
            } else {
                (hay.to_lowercase(), needle.to_lowercase())
            };
            let hit = match q.text_match {
                TextMatch::Contains => hay.contains(&needle),
                TextMatch::Exact => hay == needle,
            };
            if !hit {
                return false;
            }
        }
        if q.clickable_leaf && !(self.leaf || self.tag == "button" || self.tag == "a") {
            return false;
        }
        !(q.visible_only && !self.visible)
    }

    fn to_deep(&self, handle: u32) -> DeepNode {
        DeepNode {
            handle,
            tag: self.tag.clone(),
            text: self.text.clone(),
            own_text: self.own_text.clone(),
            inner_text: self.text.clone(),
            parent_text: self.parent_text.clone(),
            next_sibling_text: self.next_sibling_text.clone(),
            visible: self.visible,
            depth: self.depth,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    nodes: Vec<FakeNode>,
    stalled: bool,
    no_screenshots: bool,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The portal as the default profile expects it, readings included.
    pub fn portal() -> Self {
        Self::new()
            .node(FakeNode::new("sign-in", "span", "SIGN IN").delay(2))
            .node(
                FakeNode::new("username", "input", "")
                    .selector(r#"input[name="username"]"#)
                    .after("sign-in")
                    .depth(2),
            )
            .node(
                FakeNode::new("password", "input", "")
                    .selector(r#"input[name="password"]"#)
                    .after("sign-in")
                    .depth(2),
            )
            .node(
                FakeNode::new("submit", "button", "Login")
                    .selector("button.slds-button_brand")
                    .after("sign-in")
                    .depth(2),
            )
            .node(FakeNode::new("maintenance", "p", "Maintenance").after("submit").delay(1))
            .node(FakeNode::new("runtime", "span", "27.6 Hours").after("maintenance").depth(3))
            .node(FakeNode::new("generator-data", "p", "Generator Data").after("submit"))
            .node(
                FakeNode::new("battery-label", "div", "Battery Voltage (V)")
                    .parent_text("Battery Voltage (V) 13.8")
                    .after("generator-data")
                    .depth(3),
            )
            .node(FakeNode::new("notifications", "p", "Notifications").after("submit"))
            .node(FakeNode::new("events-tab", "a", "Events (16)").after("notifications").depth(2))
            .node(
                FakeNode::new("exercise", "p", "Genset exercise completed")
                    .next_sibling("Tue, Feb 3rd, 2026 3:08 PM")
                    .after("events-tab")
                    .depth(3)
                    .delay(1),
            )
    }

    pub fn node(mut self, node: FakeNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.nodes.retain(|n| n.name != name);
        self
    }

    pub fn replace(self, node: FakeNode) -> Self {
        let name = node.name.clone();
        self.without(&name).node(node)
    }

    /// Every page call hangs forever.
    pub fn stalled(mut self) -> Self {
        self.stalled = true;
        self
    }

    pub fn without_screenshots(mut self) -> Self {
        self.no_screenshots = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeLog {
    pub searches: u64,
    pub clicks: Vec<String>,
    pub fills: Vec<(String, String)>,
    pub navigations: Vec<String>,
    pub contexts_opened: usize,
    pub contexts_closed: usize,
}

#[derive(Debug)]
struct FakeState {
    page: FakePage,
    opened: HashMap<String, u64>,
    url: String,
    log: FakeLog,
}

impl FakeState {
    fn revealed(&self, node: &FakeNode) -> bool {
        let opened_at = match &node.gate {
            None => Some(0),
            Some(gate) => self.opened.get(gate).copied(),
        };
        opened_at.is_some_and(|at| self.log.searches > at + node.delay)
    }

    fn search(&mut self, query: &NodeQuery) -> Value {
        self.log.searches += 1;
        let found: Vec<DeepNode> = self
            .page
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| self.revealed(n) && n.matches(query))
            .take(query.limit)
            .map(|(i, n)| n.to_deep(i as u32))
            .collect();
        json!(found)
    }

    fn act(&mut self, request: ActionRequest) -> Value {
        let Some(node) = self.page.nodes.get(request.handle as usize).cloned() else {
            return json!({ "ok": false, "reason": "element is gone (page changed?)" });
        };
        match request.kind.as_str() {
            "click" | "click_parent" => {
                self.opened.entry(node.name.clone()).or_insert(self.log.searches);
                self.log.clicks.push(node.name);
                json!({ "ok": true })
            }
            "fill" if node.takes_input() => {
                self.log
                    .fills
                    .push((node.name, request.value.unwrap_or_default()));
                json!({ "ok": true })
            }
            "fill" => json!({ "ok": false, "reason": "element does not take input" }),
            other => json!({ "ok": false, "reason": format!("unsupported action {other}") }),
        }
    }
}

/// Renderer whose contexts all share one scripted page.
#[derive(Clone)]
pub struct FakeRenderer {
    state: Arc<Mutex<FakeState>>,
}

impl FakeRenderer {
    pub fn new(page: FakePage) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                page,
                opened: HashMap::new(),
                url: "about:blank".to_string(),
                log: FakeLog::default(),
            })),
        }
    }

    /// What has happened so far.
    pub fn log(&self) -> FakeLog {
        lock(&self.state).log.clone()
    }
}

fn lock(state: &Mutex<FakeState>) -> MutexGuard<'_, FakeState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        lock(&self.state).log.contexts_opened += 1;
        Ok(Box::new(FakeContext {
            state: Arc::clone(&self.state),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

pub struct FakeContext {
    state: Arc<Mutex<FakeState>>,
}

impl FakeContext {
    fn stalled(&self) -> bool {
        lock(&self.state).page.stalled
    }
}

#[async_trait]
impl RenderContext for FakeContext {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
        if self.stalled() {
            std::future::pending::<()>().await;
        }
        let mut state = lock(&self.state);
        state.log.navigations.push(url.to_string());
        state.url = url.to_string();
        Ok(NavigationResult {
            final_url: url.to_string(),
            load_time_ms: 1,
        })
    }

    async fn execute_js(&self, script: &str) -> Result<Value> {
        if self.stalled() {
            std::future::pending::<()>().await;
        }
        let mut state = lock(&self.state);
        if let Some(query) = NodeQuery::from_script(script) {
            return Ok(state.search(&query));
        }
        if let Some(request) = ActionRequest::from_script(script) {
            return Ok(state.act(request));
        }
        Ok(Value::Null)
    }

    async fn get_url(&self) -> Result<String> {
        Ok(lock(&self.state).url.clone())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        if self.stalled() {
            std::future::pending::<()>().await;
        }
        if lock(&self.state).page.no_screenshots {
            return Err(anyhow!("screenshots unavailable"));
        }
        Ok(FAKE_PNG.to_vec())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        lock(&self.state).log.contexts_closed += 1;
        Ok(())
    }
}
