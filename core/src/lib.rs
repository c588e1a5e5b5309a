//! In-memory TF-IDF search over short text documents.
//!
//! Documents are split on single spaces, stop words are dropped, and every
//! remaining word is indexed with its term frequency. Queries support plus and
//! minus words and run either sequentially or fanned out over a thread pool.

pub mod concurrent_map;
pub mod dedup;
pub mod document;
pub mod error;
pub mod index;
pub mod policy;
pub mod query;
pub mod ranking;
pub mod request_queue;
pub mod tokenizer;

pub use concurrent_map::{Access, ConcurrentMap, ShardKey};
pub use dedup::remove_duplicates;
pub use document::{compute_average_rating, Document, DocumentId, DocumentStatus};
pub use error::{ErrorKind, Result, SearchError};
pub use index::{SearchServer, SearchServerConfig, MAX_RESULT_DOCUMENT_COUNT};
pub use policy::ExecutionPolicy;
pub use query::Query;
pub use request_queue::{RequestQueue, MIN_IN_DAY};
pub use tokenizer::StopWords;
