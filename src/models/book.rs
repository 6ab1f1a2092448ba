//! Book and stream models and the catalog query shape

use serde::{Deserialize, Serialize};

pub type StreamId = i64;
pub type BookId = i64;

/// Subject stream: a closed, server-owned classification used to filter
/// the catalog. Immutable from the client's perspective within a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stream {
    pub id: StreamId,
    pub name: String,
}

/// Stream selector for catalog queries.
///
/// `All` is a client-side sentinel meaning the *absence* of the stream
/// constraint. It never reaches the server as a filter value:
/// [`BookQuery::query_pairs`] omits the parameter entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StreamFilter {
    #[default]
    All,
    Stream(StreamId),
}

/// One entry of the stream selector presented to the user. The first
/// choice is always the synthetic "All Streams" sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChoice {
    pub filter: StreamFilter,
    pub label: String,
}

impl StreamChoice {
    pub fn all() -> Self {
        Self {
            filter: StreamFilter::All,
            label: "All Streams".to_string(),
        }
    }
}

impl From<Stream> for StreamChoice {
    fn from(stream: Stream) -> Self {
        Self {
            filter: StreamFilter::Stream(stream.id),
            label: stream.name,
        }
    }
}

/// Catalog entry. Read-only to this client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub stream: Option<StreamId>,
    #[serde(default)]
    pub stream_name: Option<String>,
}

impl Book {
    pub fn author_display(&self) -> &str {
        self.author_name.as_deref().unwrap_or("Unknown")
    }

    pub fn stream_display(&self) -> &str {
        self.stream_name.as_deref().unwrap_or("All")
    }
}

/// Combined catalog query: zero or more optional constraints, ANDed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookQuery {
    pub text: Option<String>,
    pub stream: StreamFilter,
}

impl BookQuery {
    /// Outgoing query parameters. Blank text and `StreamFilter::All`
    /// contribute nothing.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(text) = self.text.as_deref() {
            let text = text.trim();
            if !text.is_empty() {
                pairs.push(("search", text.to_string()));
            }
        }
        if let StreamFilter::Stream(id) = self.stream {
            pairs.push(("stream", id.to_string()));
        }
        pairs
    }
}
