//! Template stores
//!
//! A store answers `resolve(adapter, name)` with template text. Projects
//! override builtin templates by placing files under
//! `<template_path>/<adapter>/<name>.sql`; a [`LayeredStore`] consults
//! the project directories before the builtin set.

use crate::builtins::get_builtin;
use crate::error::{JinjaError, JinjaResult};
use std::path::{Path, PathBuf};

/// Lookup of template text by `(adapter, template name)`
pub trait TemplateStore: Send + Sync {
    /// Template source, or `None` when this store has no such template
    fn resolve(&self, adapter: &str, name: &str) -> JinjaResult<Option<String>>;
}

/// Templates compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinStore;

impl TemplateStore for BuiltinStore {
    fn resolve(&self, adapter: &str, name: &str) -> JinjaResult<Option<String>> {
        Ok(get_builtin(adapter, name).map(str::to_string))
    }
}

/// Templates read from `<root>/<adapter>/<name>.sql`
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Create a store rooted at a template directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of this store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn template_path(&self, adapter: &str, name: &str) -> Option<PathBuf> {
        // Names are slash separated; reject anything escaping the root
        if name
            .split('/')
            .any(|part| part.is_empty() || part == "." || part == "..")
        {
            return None;
        }
        let mut path = self.root.join(adapter);
        for part in name.split('/') {
            path.push(part);
        }
        path.set_extension("sql");
        Some(path)
    }
}

impl TemplateStore for DirectoryStore {
    fn resolve(&self, adapter: &str, name: &str) -> JinjaResult<Option<String>> {
        let Some(path) = self.template_path(adapter, name) else {
            return Ok(None);
        };
        match std::fs::read_to_string(&path) {
            Ok(source) => {
                log::debug!("Using project template {}", path.display());
                Ok(Some(source))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(JinjaError::TemplateIo {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }
}

/// Stores consulted in order; the first hit wins
#[derive(Default)]
pub struct LayeredStore {
    layers: Vec<Box<dyn TemplateStore>>,
}

impl LayeredStore {
    /// Create an empty layered store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer with lower priority than the existing ones
    pub fn with_layer(mut self, store: impl TemplateStore + 'static) -> Self {
        self.layers.push(Box::new(store));
        self
    }

    /// Project directories first, then the builtin templates
    pub fn for_project(template_dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        template_dirs
            .into_iter()
            .fold(Self::new(), |store, dir| {
                store.with_layer(DirectoryStore::new(dir))
            })
            .with_layer(BuiltinStore)
    }
}

impl TemplateStore for LayeredStore {
    fn resolve(&self, adapter: &str, name: &str) -> JinjaResult<Option<String>> {
        for layer in &self.layers {
            if let Some(source) = layer.resolve(adapter, name)? {
                return Ok(Some(source));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
