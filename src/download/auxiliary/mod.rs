//! Provider-specific post-processing that runs after an item is organized.
//!
//! A task fetches supplementary assets (cover art and similar) into the
//! organized directory. Tasks are keyed by [`ProviderTag`]; providers without
//! a registered task skip this step. New tasks are added by implementing
//! [`AuxiliaryTask`] and calling [`AuxRegistry::register`].

pub mod album_art;
pub mod script_literal;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::core::error::AppResult;
use crate::download::provider::ProviderTag;

pub use album_art::AlbumArtTask;

#[async_trait]
pub trait AuxiliaryTask: Send + Sync {
    /// Short name used in log lines (e.g., "album-art")
    fn name(&self) -> &str;

    /// Runs the task for `url`, writing any assets into `item_dir`.
    async fn run(&self, url: &str, item_dir: &Path) -> AppResult<()>;
}

/// Maps providers to their post-processing task.
#[derive(Clone, Default)]
pub struct AuxRegistry {
    tasks: HashMap<ProviderTag, Arc<dyn AuxiliaryTask>>,
}

impl AuxRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `task` for `tag`, replacing any previous task.
    pub fn register(&mut self, tag: ProviderTag, task: Arc<dyn AuxiliaryTask>) {
        self.tasks.insert(tag, task);
    }

    pub fn get(&self, tag: ProviderTag) -> Option<Arc<dyn AuxiliaryTask>> {
        self.tasks.get(&tag).cloned()
    }

    /// Registry with the built-in tasks.
    pub fn default_registry() -> Self {
        let mut registry = Self::new();
        registry.register(ProviderTag::VideoSiteMusic, Arc::new(AlbumArtTask::new()));
        registry
    }

    /// Runs the task registered for `tag`. Returns `Ok(false)` when there is none.
    pub async fn run(&self, tag: ProviderTag, url: &str, item_dir: &Path) -> AppResult<bool> {
        let Some(task) = self.get(tag) else {
            return Ok(false);
        };

        log::info!("Running auxiliary task '{}' for {}", task.name(), tag);
        task.run(url, item_dir).await?;
        Ok(true)
    }
}

impl std::fmt::Debug for AuxRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<(String, &str)> = self.tasks.iter().map(|(tag, t)| (tag.to_string(), t.name())).collect();
        names.sort();
        f.debug_map().entries(names).finish()
    }
}
