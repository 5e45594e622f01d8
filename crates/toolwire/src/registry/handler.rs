//! Handler traits for registered capabilities, plus closure adapters.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{McpResult, PromptGetResult, ReadResourceResult};

/// Executes a tool. Arguments arrive exactly as the client sent them
/// (an empty object when omitted).
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: Value) -> McpResult<Value>;
}

/// Produces the contents of a resource.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn read(&self, uri: &str) -> McpResult<ReadResourceResult>;
}

/// Expands a prompt template.
#[async_trait]
pub trait PromptHandler: Send + Sync {
    async fn get(&self, arguments: Value) -> McpResult<PromptGetResult>;
}

struct ToolFn<F>(F);

#[async_trait]
impl<F, Fut> ToolHandler for ToolFn<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = McpResult<Value>> + Send,
{
    async fn call(&self, arguments: Value) -> McpResult<Value> {
        (self.0)(arguments).await
    }
}

struct ResourceFn<F>(F);

#[async_trait]
impl<F, Fut> ResourceHandler for ResourceFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = McpResult<ReadResourceResult>> + Send,
{
    async fn read(&self, uri: &str) -> McpResult<ReadResourceResult> {
        (self.0)(uri.to_string()).await
    }
}

struct PromptFn<F>(F);

#[async_trait]
impl<F, Fut> PromptHandler for PromptFn<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = McpResult<PromptGetResult>> + Send,
{
    async fn get(&self, arguments: Value) -> McpResult<PromptGetResult> {
        (self.0)(arguments).await
    }
}

/// Wrap an async closure as a [`ToolHandler`].
pub fn tool_fn<F, Fut>(f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = McpResult<Value>> + Send + 'static,
{
    Arc::new(ToolFn(f))
}

/// Wrap an async closure as a [`ResourceHandler`]. The closure receives the URI.
pub fn resource_fn<F, Fut>(f: F) -> Arc<dyn ResourceHandler>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = McpResult<ReadResourceResult>> + Send + 'static,
{
    Arc::new(ResourceFn(f))
}

/// Wrap an async closure as a [`PromptHandler`].
pub fn prompt_fn<F, Fut>(f: F) -> Arc<dyn PromptHandler>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = McpResult<PromptGetResult>> + Send + 'static,
{
    Arc::new(PromptFn(f))
}
