//! Registry source implementations

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use futures::future::BoxFuture;
use futures::FutureExt;

use super::{parse_catalog, parse_registry, OsTemplate, Registry, RegistrySource};
use crate::error::{Result, WizardError};

/// Registry source reading a registry response and a catalog from JSON files.
///
/// Files are re-read on every call so an edited file is picked up when the
/// user retries a failed load.
#[derive(Debug, Clone)]
pub struct FileRegistrySource {
    registry_path: PathBuf,
    catalog_path: PathBuf,
}

impl FileRegistrySource {
    pub fn new(registry_path: impl Into<PathBuf>, catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            registry_path: registry_path.into(),
            catalog_path: catalog_path.into(),
        }
    }
}

async fn read_json_file(path: PathBuf) -> Result<String> {
    tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))
        .map_err(|e| WizardError::registry(format!("{e:#}")))
}

impl RegistrySource for FileRegistrySource {
    fn load_registry(&self) -> BoxFuture<'static, Result<Registry>> {
        let path = self.registry_path.clone();
        async move {
            let body = read_json_file(path.clone()).await?;
            let registry = parse_registry(&body)
                .map_err(|e| WizardError::registry(format!("{:?}: {e}", path)))?;
            tracing::info!(
                "Loaded registry from {:?}: {} mpack(s), {} use case(s)",
                path,
                registry.mpacks.len(),
                registry.use_cases.len()
            );
            Ok(registry)
        }
        .boxed()
    }

    fn load_repository_catalog(
        &self,
        stack_name: &str,
        stack_version: &str,
    ) -> BoxFuture<'static, Result<Vec<OsTemplate>>> {
        let path = self.catalog_path.clone();
        let stack_name = stack_name.to_string();
        let stack_version = stack_version.to_string();
        async move {
            let body = read_json_file(path.clone()).await?;
            let catalog = parse_catalog(&body)
                .map_err(|e| WizardError::registry(format!("{:?}: {e}", path)))?;
            catalog
                .iter()
                .find(|e| e.stack_name == stack_name && e.stack_version == stack_version)
                .map(|e| e.templates())
                .ok_or_else(|| {
                    WizardError::registry(format!(
                        "No repository catalog for {stack_name} {stack_version}"
                    ))
                })
        }
        .boxed()
    }
}

/// In-memory registry source, used for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistrySource {
    registry: Arc<Registry>,
    catalog: Arc<HashMap<(String, String), Vec<OsTemplate>>>,
}

impl StaticRegistrySource {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
            catalog: Arc::default(),
        }
    }

    /// Add the catalog entry for one stack version
    pub fn with_catalog(
        mut self,
        stack_name: &str,
        stack_version: &str,
        templates: Vec<OsTemplate>,
    ) -> Self {
        Arc::make_mut(&mut self.catalog)
            .insert((stack_name.to_string(), stack_version.to_string()), templates);
        self
    }
}

impl RegistrySource for StaticRegistrySource {
    fn load_registry(&self) -> BoxFuture<'static, Result<Registry>> {
        let registry = Registry::clone(&self.registry);
        async move { Ok(registry) }.boxed()
    }

    fn load_repository_catalog(
        &self,
        stack_name: &str,
        stack_version: &str,
    ) -> BoxFuture<'static, Result<Vec<OsTemplate>>> {
        let found = self
            .catalog
            .get(&(stack_name.to_string(), stack_version.to_string()))
            .cloned();
        let missing = format!("No repository catalog for {stack_name} {stack_version}");
        async move { found.ok_or_else(|| WizardError::registry(missing)) }.boxed()
    }
}
