//! Provider implementations and the registry

mod ollama;
mod openai;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::traits::{Provider, ProviderRegistry};

/// Simple in-process registry keyed by provider name
#[derive(Default)]
pub struct InMemoryRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own name; replaces any previous
    /// registration with the same name.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        info!(provider = provider.name(), "registering provider");
        self.providers.insert(provider.name().to_string(), provider);
    }
}

impl ProviderRegistry for InMemoryRegistry {
    fn get(&self, name: &str) -> EngineResult<Arc<dyn Provider>> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::ProviderNotFound {
                name: name.to_string(),
            })
    }

    fn list_available(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .providers
            .values()
            .filter(|p| p.is_available())
            .map(|p| p.name().to_string())
            .collect();
        names.sort();
        names
    }

    fn list_embedding_capable(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .providers
            .values()
            .filter(|p| p.is_available() && p.supports_embeddings())
            .map(|p| p.name().to_string())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockProvider;

    fn mock_named(name: &'static str, available: bool, embeddings: bool) -> Arc<dyn Provider> {
        let mut provider = MockProvider::new();
        provider.expect_name().return_const(name.to_string());
        provider.expect_is_available().return_const(available);
        provider.expect_supports_embeddings().return_const(embeddings);
        Arc::new(provider)
    }

    #[test]
    fn test_registry_lookup_and_listing() {
        let mut registry = InMemoryRegistry::new();
        registry.register(mock_named("openai", true, true));
        registry.register(mock_named("ollama", true, false));
        registry.register(mock_named("offline", false, true));

        assert!(registry.get("openai").is_ok());
        assert!(matches!(
            registry.get("missing"),
            Err(EngineError::ProviderNotFound { .. })
        ));
        assert_eq!(registry.list_available(), vec!["ollama", "openai"]);
        assert_eq!(registry.list_embedding_capable(), vec!["openai"]);
    }

    #[test]
    fn test_reregistering_replaces_previous() {
        let mut registry = InMemoryRegistry::new();
        registry.register(mock_named("openai", false, false));
        registry.register(mock_named("openai", true, true));

        assert_eq!(registry.list_available(), vec!["openai"]);
    }
}
