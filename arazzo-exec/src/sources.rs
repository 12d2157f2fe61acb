//! Per-run registry of the documents a workflow document's source descriptions point at.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arazzo_core::types::{ArazzoDocument, SourceDescriptionType};
use arazzo_core::{parse, ParseOptions};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::Value;

use crate::executor::HttpClient;
use crate::openapi::{load_text, parse_tree, LoadError, Location, OpenApiDoc};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("source description `{name}`: {source}")]
    Load {
        name: String,
        #[source]
        source: LoadError,
    },
    #[error("source description `{name}` is not a valid Arazzo document ({errors} errors, first: {first})")]
    InvalidNested {
        name: String,
        errors: usize,
        first: String,
    },
    #[error("source descriptions form a cycle: {0}")]
    Cycle(String),
}

/// Pre-registered documents and alternate locations, keyed by source description name.
#[derive(Debug, Clone, Default)]
pub struct SourceOverrides {
    /// Already-parsed trees used instead of loading the description's `url`.
    pub documents: BTreeMap<String, Value>,
    /// Locations used instead of the description's `url`.
    pub locations: BTreeMap<String, String>,
}

/// Loads source descriptions through the HTTP seam or the file system.
pub struct SourceLoader {
    pub client: Arc<dyn HttpClient>,
    pub overrides: SourceOverrides,
    pub parse_options: ParseOptions,
    pub timeout: Duration,
    pub max_bytes: usize,
}

/// A workflow document together with its loaded interface documents and nested documents.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    document: Arc<ArazzoDocument>,
    location: Option<Location>,
    openapi: Vec<OpenApiDoc>,
    nested: BTreeMap<String, Arc<SourceRegistry>>,
}

impl SourceRegistry {
    /// A registry with nothing loaded; interface documents can be added with [`Self::with_openapi`].
    pub fn new(document: Arc<ArazzoDocument>) -> Self {
        let location = document.source_path.clone().map(Location::File);
        Self {
            document,
            location,
            openapi: Vec::new(),
            nested: BTreeMap::new(),
        }
    }

    pub fn with_openapi(mut self, name: impl Into<String>, location: impl Into<String>, raw: Value) -> Self {
        self.openapi.push(OpenApiDoc {
            name: name.into(),
            location: location.into(),
            raw,
        });
        self
    }

    pub fn with_nested(mut self, name: impl Into<String>, nested: SourceRegistry) -> Self {
        self.nested.insert(name.into(), Arc::new(nested));
        self
    }

    /// Loads every source description of `document`, recursing into nested Arazzo documents.
    pub async fn load(document: Arc<ArazzoDocument>, loader: &SourceLoader) -> Result<Self, SourceError> {
        let root = Self::new(document);
        let visiting = root.location.iter().map(Location::as_string).collect();
        load_into(root, loader, visiting).await
    }

    pub fn document(&self) -> &Arc<ArazzoDocument> {
        &self.document
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn openapi_docs(&self) -> &[OpenApiDoc] {
        &self.openapi
    }

    pub fn openapi_doc(&self, name: &str) -> Option<&OpenApiDoc> {
        self.openapi.iter().find(|d| d.name == name)
    }

    pub fn nested(&self, name: &str) -> Option<&Arc<SourceRegistry>> {
        self.nested.get(name)
    }
}

fn load_into<'a>(
    mut registry: SourceRegistry,
    loader: &'a SourceLoader,
    visiting: Vec<String>,
) -> BoxFuture<'a, Result<SourceRegistry, SourceError>> {
    async move {
        let document = Arc::clone(&registry.document);
        for src in &document.source_descriptions {
            let name = src.name.clone();
            let reference = loader.overrides.locations.get(&name).unwrap_or(&src.url);
            let target = Location::resolve(reference, registry.location.as_ref());
            let key = target.as_string();

            let tree = match loader.overrides.documents.get(&name) {
                Some(tree) => tree.clone(),
                None => {
                    if src.source_type == SourceDescriptionType::Arazzo && visiting.contains(&key) {
                        let mut chain = visiting.clone();
                        chain.push(key);
                        return Err(SourceError::Cycle(chain.join(" -> ")));
                    }
                    tracing::debug!(source = %name, location = %key, "loading source description");
                    let text = load_text(loader.client.as_ref(), &target, loader.timeout, loader.max_bytes)
                        .await
                        .map_err(|source| SourceError::Load { name: name.clone(), source })?;
                    parse_tree(&target, &text).map_err(|source| SourceError::Load { name: name.clone(), source })?
                }
            };

            match src.source_type {
                SourceDescriptionType::Openapi => registry.openapi.push(OpenApiDoc {
                    name,
                    location: key,
                    raw: tree,
                }),
                SourceDescriptionType::Arazzo => {
                    let source_path = match &target {
                        Location::File(path) => Some(path.clone()),
                        Location::Remote(_) => None::<PathBuf>,
                    };
                    let outcome = parse(&tree, source_path.as_deref(), &loader.parse_options);
                    let nested_doc = match outcome.valid_document() {
                        Some(doc) => Arc::new(doc.clone()),
                        None => {
                            return Err(SourceError::InvalidNested {
                                name,
                                errors: outcome.diagnostics.error_count(),
                                first: outcome
                                    .diagnostics
                                    .iter()
                                    .next()
                                    .map(ToString::to_string)
                                    .unwrap_or_default(),
                            })
                        }
                    };
                    let mut nested = SourceRegistry::new(nested_doc);
                    nested.location = Some(target);
                    let mut chain = visiting.clone();
                    chain.push(key);
                    let nested = load_into(nested, loader, chain).await?;
                    registry.nested.insert(name, Arc::new(nested));
                }
            }
        }
        Ok(registry)
    }
    .boxed()
}
