pub mod embeddings;
pub mod feedback_store;
pub mod generation;
pub mod ingest;
pub mod normalizer;
pub mod orchestrator;
pub mod prompt;
pub mod response_parser;
pub mod retry;
pub mod vector_index;

#[cfg(test)]
pub(crate) mod testing;
