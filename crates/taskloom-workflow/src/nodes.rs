//! Integration nodes and the type registry.
//!
//! Every node adapter implements [`IntegrationNode`]: a single async
//! `execute(input) -> output` contract over JSON values. The
//! [`NodeRegistry`] maps a type tag to a factory that instantiates the
//! adapter from a [`WorkflowNode`] definition; registration is open and a
//! later registration for the same tag replaces the earlier one.
//!
//! The built-in adapters model their integrations by contract — inputs
//! consumed and outputs produced — not by wire protocol; real delivery is
//! an external collaborator's job.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::model::WorkflowNode;

// ---------------------------------------------------------------------------
// Trait and registry
// ---------------------------------------------------------------------------

/// The universal integration-node interface.
#[async_trait]
pub trait IntegrationNode: Send + Sync {
    /// Execute the node with the upstream node's output as `input`.
    async fn execute(&self, input: Value) -> Result<Value>;
}

/// Constructs an adapter instance from a node definition.
pub type NodeFactory = Arc<dyn Fn(&WorkflowNode) -> Arc<dyn IntegrationNode> + Send + Sync>;

/// Concurrent type-tag → factory registry, cheaply cloneable.
#[derive(Clone, Default)]
pub struct NodeRegistry {
    inner: Arc<DashMap<String, NodeFactory>>,
}

impl NodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }

    /// Create a registry with the built-in integrations registered:
    /// `mail_send`, `chat_post`, `spreadsheet`, `http_request`.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register("mail_send", |node| {
            Arc::new(MailSendNode::from_node(node)) as Arc<dyn IntegrationNode>
        });
        registry.register("chat_post", |node| {
            Arc::new(ChatPostNode::from_node(node)) as Arc<dyn IntegrationNode>
        });
        registry.register("spreadsheet", |node| {
            Arc::new(SpreadsheetNode::from_node(node)) as Arc<dyn IntegrationNode>
        });
        registry.register("http_request", |node| {
            Arc::new(HttpRequestNode::from_node(node)) as Arc<dyn IntegrationNode>
        });
        registry
    }

    /// Register a node type.
    ///
    /// A later registration for the same tag silently replaces the earlier
    /// one.
    pub fn register<F>(&self, node_type: impl Into<String>, factory: F)
    where
        F: Fn(&WorkflowNode) -> Arc<dyn IntegrationNode> + Send + Sync + 'static,
    {
        let node_type = node_type.into();
        info!(node_type = %node_type, "node type registered");
        self.inner.insert(node_type, Arc::new(factory));
    }

    /// Instantiate the adapter for a node, or `None` for unknown tags.
    pub fn instantiate(&self, node: &WorkflowNode) -> Option<Arc<dyn IntegrationNode>> {
        self.inner
            .get(&node.node_type)
            .map(|factory| factory(node))
    }

    /// Whether a type tag is registered.
    pub fn contains(&self, node_type: &str) -> bool {
        self.inner.contains_key(node_type)
    }

    /// Number of registered node types.
    pub fn count(&self) -> usize {
        self.inner.len()
    }

    /// All registered type tags.
    pub fn list_types(&self) -> Vec<String> {
        self.inner.iter().map(|e| e.key().clone()).collect()
    }
}

fn param_str(parameters: &HashMap<String, Value>, key: &str) -> Option<String> {
    parameters.get(key).and_then(Value::as_str).map(String::from)
}

// ---------------------------------------------------------------------------
// Built-in adapters
// ---------------------------------------------------------------------------

/// Sends an email through the configured mail integration.
pub struct MailSendNode {
    node_id: String,
    parameters: HashMap<String, Value>,
}

impl MailSendNode {
    fn from_node(node: &WorkflowNode) -> Self {
        Self {
            node_id: node.id.clone(),
            parameters: node.parameters.clone(),
        }
    }
}

#[async_trait]
impl IntegrationNode for MailSendNode {
    async fn execute(&self, _input: Value) -> Result<Value> {
        let to = param_str(&self.parameters, "to");
        info!(node_id = %self.node_id, to = ?to, "mail_send: sending email");

        Ok(json!({
            "success": true,
            "message_id": format!("msg_{}", Uuid::now_v7().simple()),
            "to": to,
            "subject": param_str(&self.parameters, "subject"),
            "sent_at": Utc::now().to_rfc3339(),
        }))
    }
}

/// Posts a message to a chat channel.
pub struct ChatPostNode {
    node_id: String,
    parameters: HashMap<String, Value>,
}

impl ChatPostNode {
    fn from_node(node: &WorkflowNode) -> Self {
        Self {
            node_id: node.id.clone(),
            parameters: node.parameters.clone(),
        }
    }
}

#[async_trait]
impl IntegrationNode for ChatPostNode {
    async fn execute(&self, _input: Value) -> Result<Value> {
        let channel = param_str(&self.parameters, "channel");
        info!(node_id = %self.node_id, channel = ?channel, "chat_post: posting message");

        Ok(json!({
            "success": true,
            "channel": channel,
            "message": param_str(&self.parameters, "text"),
            "posted_at": Utc::now().to_rfc3339(),
        }))
    }
}

/// Runs an operation against a spreadsheet.
pub struct SpreadsheetNode {
    node_id: String,
    parameters: HashMap<String, Value>,
}

impl SpreadsheetNode {
    fn from_node(node: &WorkflowNode) -> Self {
        Self {
            node_id: node.id.clone(),
            parameters: node.parameters.clone(),
        }
    }
}

#[async_trait]
impl IntegrationNode for SpreadsheetNode {
    async fn execute(&self, _input: Value) -> Result<Value> {
        let operation =
            param_str(&self.parameters, "operation").unwrap_or_else(|| "append".to_string());
        info!(node_id = %self.node_id, operation = %operation, "spreadsheet: running operation");

        Ok(json!({
            "success": true,
            "operation": operation,
            "spreadsheet_id": param_str(&self.parameters, "spreadsheet_id"),
            "rows_affected": 1,
        }))
    }
}

/// Makes an HTTP call to an arbitrary endpoint.
pub struct HttpRequestNode {
    node_id: String,
    parameters: HashMap<String, Value>,
}

impl HttpRequestNode {
    fn from_node(node: &WorkflowNode) -> Self {
        Self {
            node_id: node.id.clone(),
            parameters: node.parameters.clone(),
        }
    }
}

#[async_trait]
impl IntegrationNode for HttpRequestNode {
    async fn execute(&self, _input: Value) -> Result<Value> {
        let method = param_str(&self.parameters, "method").unwrap_or_else(|| "GET".to_string());
        let url = param_str(&self.parameters, "url");
        info!(node_id = %self.node_id, method = %method, url = ?url, "http_request: calling");

        Ok(json!({
            "success": true,
            "status_code": 200,
            "method": method,
            "url": url,
            "response": { "data": "simulated response" },
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
