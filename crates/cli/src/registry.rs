// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Name-to-constructor registry for stream providers.

use std::collections::HashMap;
use std::sync::Arc;

use crate::arena::ArenaProvider;
use crate::config::ReplayOptions;
use crate::error::{ReplayError, Result};
use crate::provider::ReplayProvider;
use crate::session::StreamInputSupport;
use crate::settings::ReplaySettings;

/// Builds a provider from options
pub type ProviderFactory =
    Arc<dyn Fn(&ReplayOptions) -> Result<Arc<dyn StreamInputSupport>> + Send + Sync>;

/// Explicit registry passed to whatever composes providers
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the replay providers registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ReplayProvider::ID, |options: &ReplayOptions| {
            let settings = ReplaySettings::new(options.config);
            let provider = ReplayProvider::from_file(&options.path, settings)?;
            Ok(Arc::new(provider) as Arc<dyn StreamInputSupport>)
        });
        registry.register(ArenaProvider::ID, |options: &ReplayOptions| {
            let settings = ReplaySettings::new(options.config);
            let provider = ArenaProvider::from_file(&options.path, settings)?;
            Ok(Arc::new(provider) as Arc<dyn StreamInputSupport>)
        });
        registry
    }

    /// Register a constructor, replacing any previous one with that name
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ReplayOptions) -> Result<Arc<dyn StreamInputSupport>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn create(
        &self,
        name: &str,
        options: &ReplayOptions,
    ) -> Result<Arc<dyn StreamInputSupport>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ReplayError::UnknownProvider(name.to_string()))?;
        factory(options)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
