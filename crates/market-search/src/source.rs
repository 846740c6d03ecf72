//! The data-source seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::compiler::QueryRequest;
use crate::error::SearchError;
use crate::normalize::RawRow;

/// One page of raw rows plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryPage {
    pub rows: Vec<RawRow>,
    pub total_count: u64,
}

impl QueryPage {
    pub fn new(rows: Vec<RawRow>, total_count: u64) -> Self {
        Self { rows, total_count }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Executes compiled queries against a product catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn query(&self, request: &QueryRequest) -> Result<QueryPage, SearchError>;
}

#[async_trait]
impl<S: CatalogSource + ?Sized> CatalogSource for std::sync::Arc<S> {
    async fn query(&self, request: &QueryRequest) -> Result<QueryPage, SearchError> {
        (**self).query(request).await
    }
}

#[async_trait]
impl<S: CatalogSource + ?Sized> CatalogSource for Box<S> {
    async fn query(&self, request: &QueryRequest) -> Result<QueryPage, SearchError> {
        (**self).query(request).await
    }
}
