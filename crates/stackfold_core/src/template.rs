//! Template and resource views over a loaded document.

use std::path::Path;

use serde_yaml::{Mapping, Value};
use stackfold_yaml::{dump_json, dump_yaml, key_to_string, to_plain_data, TemplateLoader};
use tracing::warn;

use crate::error::{StackError, StackResult};

const RESOURCES: &str = "Resources";
const TYPE: &str = "Type";
const PROPERTIES: &str = "Properties";
const DELETION_POLICY: &str = "DeletionPolicy";

/// A loaded template: the document's top-level mapping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    root: Mapping,
}

impl Template {
    /// Wrap a document. An empty document is an empty template.
    pub fn from_value(value: Value) -> StackResult<Self> {
        match value {
            Value::Mapping(root) => Ok(Self { root }),
            Value::Null => Ok(Self::default()),
            _ => Err(StackError::InvalidTemplate(
                "template root must be a mapping".to_string(),
            )),
        }
    }

    /// Load and wrap the template at `path`.
    pub fn load(loader: &TemplateLoader, path: &Path) -> StackResult<Self> {
        Self::from_value(loader.load_file(path)?)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Resources in template order. A missing `Resources` key yields none.
    pub fn resources(&self) -> StackResult<Vec<(String, ResourceDef)>> {
        let resources = match self.root.get(RESOURCES) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Mapping(resources)) => resources,
            Some(_) => {
                return Err(StackError::InvalidTemplate(
                    "Resources must be a mapping".to_string(),
                ))
            }
        };

        resources
            .iter()
            .map(|(key, value)| -> StackResult<(String, ResourceDef)> {
                let name = key_to_string(key)?;
                let def = ResourceDef::from_value(&name, value)?;
                Ok((name, def))
            })
            .collect()
    }

    /// Replace `Resources` with the given entries, in order.
    ///
    /// A repeated name replaces the earlier definition in place.
    pub fn set_resources(&mut self, resources: impl IntoIterator<Item = (String, ResourceDef)>) {
        let mut mapping = Mapping::new();
        for (name, def) in resources {
            if mapping
                .insert(Value::String(name.clone()), def.into_value())
                .is_some()
            {
                warn!("Resource name collision: {} defined more than once", name);
            }
        }
        self.root
            .insert(Value::String(RESOURCES.to_string()), Value::Mapping(mapping));
    }

    pub fn as_value(&self) -> Value {
        Value::Mapping(self.root.clone())
    }

    pub fn to_yaml(&self) -> StackResult<String> {
        Ok(dump_yaml(&self.as_value())?)
    }

    pub fn to_json(&self) -> StackResult<String> {
        Ok(dump_json(&self.as_value())?)
    }

    pub fn to_plain_data(&self) -> StackResult<serde_json::Value> {
        Ok(to_plain_data(&self.as_value())?)
    }
}

/// One entry of a template's `Resources` mapping.
///
/// Keeps the original key order and any keys besides the ones it has
/// accessors for.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDef {
    body: Mapping,
}

impl ResourceDef {
    pub fn new(resource_type: impl Into<String>) -> Self {
        let mut body = Mapping::new();
        body.insert(Value::String(TYPE.to_string()), Value::String(resource_type.into()));
        Self { body }
    }

    pub fn with_properties(mut self, properties: Value) -> Self {
        self.set(PROPERTIES, properties);
        self
    }

    pub fn from_value(name: &str, value: &Value) -> StackResult<Self> {
        match value {
            Value::Mapping(body) => Ok(Self { body: body.clone() }),
            _ => Err(StackError::InvalidTemplate(format!(
                "resource {} must be a mapping",
                name
            ))),
        }
    }

    pub fn resource_type(&self) -> Option<&str> {
        self.body.get(TYPE).and_then(Value::as_str)
    }

    pub fn properties(&self) -> Option<&Value> {
        self.body.get(PROPERTIES)
    }

    /// A single entry of `Properties`.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties()
            .and_then(Value::as_mapping)
            .and_then(|props| props.get(key))
    }

    pub fn deletion_policy(&self) -> Option<&str> {
        self.body.get(DELETION_POLICY).and_then(Value::as_str)
    }

    pub fn set_deletion_policy(&mut self, policy: impl Into<String>) {
        self.set(DELETION_POLICY, Value::String(policy.into()));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.body.insert(Value::String(key.to_string()), value);
    }

    pub fn into_value(self) -> Value {
        Value::Mapping(self.body)
    }
}
