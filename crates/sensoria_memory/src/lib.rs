pub mod rag;
pub mod store;

pub use rag::{jaccard, tokenize, RagDoc};
pub use store::{default_preferences, Bookmark, MemoryStore};
