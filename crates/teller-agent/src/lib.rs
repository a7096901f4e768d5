pub mod azure;
pub mod orchestrator;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod retriever;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use orchestrator::CompletionOrchestrator;
pub use pipeline::Assistant;
pub use provider::{LlmProvider, ProviderError};
pub use retriever::{AzureSearch, KnowledgeRetriever, SearchBackend, SearchError};
