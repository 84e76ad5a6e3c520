//! The pluggable backend seam.
//!
//! A concrete agent implements [`AgentBackend`] and is injected into the
//! `TaskManager` at construction time; the manager stays backend-agnostic.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::{AgentError, AgentResult};

/// Contract every concrete agent must satisfy.
///
/// `invoke` resolves fully before returning: whatever internal concurrency
/// the backend needs (an HTTP round-trip to a model provider, a local tool
/// chain) is its own business and must not leak a pending computation back
/// to the manager.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Content types this agent accepts and produces; used to populate the
    /// AgentCard's `defaultInputModes`/`defaultOutputModes`.
    fn supported_content_types(&self) -> &[&str] {
        &["text", "text/plain"]
    }

    /// Produce a complete response for `query` within `session_id`.
    async fn invoke(&self, query: &str, session_id: &str) -> AgentResult<String>;

    /// Produce a lazy sequence of response chunks.
    ///
    /// Only valid when the AgentCard declares streaming support. An agent
    /// that cannot stream must fail fast rather than approximate streaming
    /// with a single chunk, which is what this default does.
    fn stream(
        &self,
        query: &str,
        session_id: &str,
    ) -> AgentResult<BoxStream<'static, AgentResult<String>>> {
        let _ = (query, session_id);
        Err(AgentError::UnsupportedOperation {
            operation: "streaming".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NonStreamingBackend;

    #[async_trait]
    impl AgentBackend for NonStreamingBackend {
        async fn invoke(&self, query: &str, _session_id: &str) -> AgentResult<String> {
            Ok(query.to_string())
        }
    }

    #[test]
    fn test_stream_fails_fast_by_default() {
        let backend = NonStreamingBackend;
        let err = backend.stream("hello", "s1").err().unwrap();
        assert!(matches!(
            err,
            AgentError::UnsupportedOperation { operation } if operation == "streaming"
        ));
    }
}
