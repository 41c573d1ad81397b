//! Document loading.
//!
//! Parsing goes through `serde_yaml`, after which every tagged value in the
//! tree is constructed against the catalog. Macro tags are handed to the
//! configured [`MacroResolver`] together with the [`LoadScope`] of the file
//! being read, so relative includes resolve against that file's directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::catalog::Tag;
use crate::error::{DocumentError, DocumentResult};
use crate::macros::{FileMacros, MacroResolver};
use crate::node::{Payload, TaggedNode};

/// Base directory for resolving relative paths while a file is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadScope {
    base_dir: PathBuf,
}

impl LoadScope {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Scope of a file: its parent directory, or `.` for a bare file name.
    pub fn for_file(path: &Path) -> Self {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Self::new(parent),
            _ => Self::new("."),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve `path` against the base directory. Absolute paths pass through.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl Default for LoadScope {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Loader for templates in the tagged YAML dialect.
#[derive(Clone, Default)]
pub struct TemplateLoader {
    macros: Option<Arc<dyn MacroResolver>>,
}

impl TemplateLoader {
    /// Create a loader that keeps macro tags unevaluated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate macro tags with the given resolver.
    pub fn with_macros(mut self, resolver: impl MacroResolver + 'static) -> Self {
        self.macros = Some(Arc::new(resolver));
        self
    }

    /// Evaluate macro tags with [`FileMacros`] when `enabled`.
    pub fn evaluate_macros(self, enabled: bool) -> Self {
        if enabled {
            self.with_macros(FileMacros)
        } else {
            Self { macros: None }
        }
    }

    pub fn evaluates_macros(&self) -> bool {
        self.macros.is_some()
    }

    /// Load a document from disk.
    pub fn load_file(&self, path: &Path) -> DocumentResult<Value> {
        debug!("Loading template from {:?}", path);
        let content = fs::read_to_string(path).map_err(|e| DocumentError::from_io(path, e))?;
        let document = self.load_str(&content, &LoadScope::for_file(path))?;
        info!("Loaded template {}", path.display());
        Ok(document)
    }

    /// Load a document from text, resolving includes against `scope`.
    pub fn load_str(&self, text: &str, scope: &LoadScope) -> DocumentResult<Value> {
        parse_document(text, scope, self.macros.as_deref())
    }
}

impl std::fmt::Debug for TemplateLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateLoader")
            .field("macros", &self.evaluates_macros())
            .finish()
    }
}

/// Parse `text` and construct every tagged value in it.
pub fn parse_document(
    text: &str,
    scope: &LoadScope,
    macros: Option<&dyn MacroResolver>,
) -> DocumentResult<Value> {
    let raw: Value = serde_yaml::from_str(text)?;
    construct_tree(raw, scope, macros)
}

fn construct_tree(
    value: Value,
    scope: &LoadScope,
    macros: Option<&dyn MacroResolver>,
) -> DocumentResult<Value> {
    match value {
        Value::Sequence(items) => Ok(Value::Sequence(construct_items(items, scope, macros)?)),
        Value::Mapping(map) => Ok(Value::Mapping(construct_mapping(map, scope, macros)?)),
        Value::Tagged(tagged) => {
            let node = TaggedNode::from_tagged(&tagged)?;

            if let (Tag::Macro(tag), Some(resolver)) = (node.tag(), macros) {
                if let Payload::Scalar(argument) = node.payload() {
                    debug!("Resolving {} {}", node.tag(), argument);
                    return resolver.resolve(tag, argument, scope);
                }
            }

            let payload = match node.payload().clone() {
                Payload::Scalar(s) => Payload::Scalar(s),
                Payload::Sequence(items) => {
                    Payload::Sequence(construct_items(items, scope, macros)?)
                }
                Payload::Mapping(map) => Payload::Mapping(construct_mapping(map, scope, macros)?),
            };
            Ok(TaggedNode::new(node.tag(), payload).into_value())
        }
        scalar => Ok(scalar),
    }
}

fn construct_items(
    items: Vec<Value>,
    scope: &LoadScope,
    macros: Option<&dyn MacroResolver>,
) -> DocumentResult<Vec<Value>> {
    items
        .into_iter()
        .map(|item| construct_tree(item, scope, macros))
        .collect()
}

fn construct_mapping(
    map: Mapping,
    scope: &LoadScope,
    macros: Option<&dyn MacroResolver>,
) -> DocumentResult<Mapping> {
    let mut constructed = Mapping::new();
    for (key, value) in map {
        constructed.insert(key, construct_tree(value, scope, macros)?);
    }
    Ok(constructed)
}
