//! Full-text search over the Wikipedia abstracts dataset.
//!
//! The engine ingests `<doc>` records from an abstract dump, builds an
//! inverted index of analyzed tokens backed by roaring bitmaps, and answers
//! ranked multi-term AND queries. Both the index and the document store can
//! be persisted to JSON dumps and reloaded without re-parsing the source.

pub mod analyzer;
pub mod dump;
pub mod error;
pub mod index;
pub mod query;
pub mod xml;

pub use analyzer::Analyzer;
pub use error::{Error, Result};
pub use index::{Document, DocumentStore, IndexBuilder, InvertedIndex};
pub use query::{SearchEngine, SearchResult, SearchResults};
pub use xml::DocumentStream;
