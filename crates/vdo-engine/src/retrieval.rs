//! Retrieval collaborator seam

use vdo_domain::Specialty;

/// Retrieval failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum RetrievalError {
    /// Store unreachable
    #[error("retrieval store unavailable: {0}")]
    Unavailable(String),

    /// Query rejected by the store
    #[error("retrieval query failed: {0}")]
    QueryFailed(String),
}

/// One ranked context snippet
#[derive(Debug, Clone)]
pub struct Snippet {
    /// Where the snippet came from (document id, section)
    pub source: String,
    pub content: String,
    /// Store-assigned relevance, higher is better
    pub relevance: f64,
}

/// Query narrowing
#[derive(Debug, Clone, Default)]
pub struct RetrievalFilters {
    /// Restrict to material relevant to one specialty
    pub specialty: Option<Specialty>,
    /// Cap the number of returned snippets
    pub limit: Option<usize>,
}

/// External retrieval collaborator consumed by specialist tasks
#[async_trait::async_trait]
pub trait ContextRetrieval: Send + Sync {
    /// Query ranked snippets for a topic
    async fn query(
        &self,
        topic: &str,
        filters: &RetrievalFilters,
    ) -> Result<Vec<Snippet>, RetrievalError>;
}
