//! Per-nesting-level naming context.

use std::path::{Path, PathBuf};

use serde_yaml::Mapping;

/// Prefix of CloudFormation pseudo parameters such as `AWS::Region`.
const PSEUDO_PARAMETER_PREFIX: &str = "AWS::";

/// Naming and parameter context for one nesting level.
///
/// Each level gets a fresh context; nothing here is mutated after creation.
#[derive(Debug, Clone, Default)]
pub struct RewriteContext {
    master_template_location: Option<PathBuf>,
    parameter_bindings: Mapping,
    naming_prefix: String,
}

impl RewriteContext {
    /// Context of the root template: no prefix, no bindings.
    pub fn root(location: impl Into<PathBuf>) -> Self {
        Self {
            master_template_location: Some(location.into()),
            ..Self::default()
        }
    }

    /// Context of a nested template inlined under `prefix`.
    pub fn nested(
        location: impl Into<PathBuf>,
        parameter_bindings: Mapping,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            master_template_location: Some(location.into()),
            parameter_bindings,
            naming_prefix: prefix.into(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.naming_prefix = prefix.into();
        self
    }

    pub fn master_template_location(&self) -> Option<&Path> {
        self.master_template_location.as_deref()
    }

    pub fn parameter_bindings(&self) -> &Mapping {
        &self.parameter_bindings
    }

    pub fn naming_prefix(&self) -> &str {
        &self.naming_prefix
    }

    /// Whether `name` is supplied by the caller of the nested stack.
    pub fn is_bound(&self, name: &str) -> bool {
        self.parameter_bindings.contains_key(name)
    }

    pub fn prefixed(&self, name: &str) -> String {
        format!("{}{}", self.naming_prefix, name)
    }

    /// Name a reference to `name` points at after flattening.
    pub fn retarget(&self, name: &str) -> String {
        if self.is_bound(name) || name.starts_with(PSEUDO_PARAMETER_PREFIX) {
            name.to_string()
        } else {
            self.prefixed(name)
        }
    }

    /// Retarget a `Resource.attribute` path by its first segment.
    pub fn retarget_path(&self, path: &str) -> String {
        match path.split_once('.') {
            Some((resource, attribute)) => format!("{}.{}", self.retarget(resource), attribute),
            None => self.retarget(path),
        }
    }
}
