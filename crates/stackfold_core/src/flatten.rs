//! Nested-stack flattening.
//!
//! Resources that point at a local nested template are replaced by the
//! nested template's own resources, renamed with the pointing resource's
//! name as prefix. Every other resource has its references rewritten
//! against the current level's [`RewriteContext`].
//!
//! Final names are plain concatenations, so two levels can produce the same
//! name. That is logged, not rejected. Cyclic nesting is not detected.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde_yaml::{Mapping, Value};
use stackfold_yaml::{DocumentError, TemplateLoader};
use tracing::{debug, info};

use crate::context::RewriteContext;
use crate::error::{StackError, StackResult};
use crate::rewrite::ReferenceRewriter;
use crate::template::{ResourceDef, Template};

const LOCATION: &str = "Location";
const PARAMETERS: &str = "Parameters";
const NESTED_TEMPLATE_EXTENSION: &str = ".yaml";

/// Resource types that can point at a nested template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestedStackKind {
    CloudFormationStack,
    ServerlessApplication,
}

impl NestedStackKind {
    pub fn from_type(resource_type: &str) -> Option<Self> {
        match resource_type {
            "AWS::CloudFormation::Stack" => Some(Self::CloudFormationStack),
            "AWS::Serverless::Application" => Some(Self::ServerlessApplication),
            _ => None,
        }
    }

    pub fn resource_type(&self) -> &'static str {
        match self {
            Self::CloudFormationStack => "AWS::CloudFormation::Stack",
            Self::ServerlessApplication => "AWS::Serverless::Application",
        }
    }
}

impl fmt::Display for NestedStackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource_type())
    }
}

/// Whether `def` is a nested stack backed by a local `.yaml` template.
pub fn needs_flattening(def: &ResourceDef) -> bool {
    let is_nested = def
        .resource_type()
        .and_then(NestedStackKind::from_type)
        .is_some();

    is_nested
        && def
            .property(LOCATION)
            .and_then(Value::as_str)
            .is_some_and(|location| location.ends_with(NESTED_TEMPLATE_EXTENSION))
}

/// Flattens nested stacks into a single template.
#[derive(Default)]
pub struct Flattener {
    loader: TemplateLoader,
    rewriter: ReferenceRewriter,
}

impl Flattener {
    pub fn new(loader: TemplateLoader) -> Self {
        Self {
            loader,
            rewriter: ReferenceRewriter::new(),
        }
    }

    /// Load the template at `path` and inline all of its nested stacks.
    pub fn flatten(&self, path: &Path) -> StackResult<Template> {
        info!("Flattening {}", path.display());

        let template = Template::load(&self.loader, path)?;
        let resources = self.process_resources(&template, &RewriteContext::root(path))?;
        let count = resources.len();

        let mut flattened = template;
        flattened.set_resources(resources);

        info!("Flattened {} into {} resources", path.display(), count);
        Ok(flattened)
    }

    /// Process one template's resources in order.
    ///
    /// Nested stacks contribute their (recursively processed) resources in
    /// place of the stack resource itself.
    pub fn process_resources(
        &self,
        template: &Template,
        ctx: &RewriteContext,
    ) -> StackResult<Vec<(String, ResourceDef)>> {
        let mut processed = Vec::new();

        for (name, def) in template.resources()? {
            if needs_flattening(&def) {
                processed.extend(self.flatten_resource(&name, &def, ctx)?);
            } else {
                processed.push(self.sanitize_resource(&name, &def, ctx)?);
            }
        }

        Ok(processed)
    }

    fn flatten_resource(
        &self,
        name: &str,
        def: &ResourceDef,
        ctx: &RewriteContext,
    ) -> StackResult<Vec<(String, ResourceDef)>> {
        let resource_type = def.resource_type().unwrap_or_default();
        match NestedStackKind::from_type(resource_type) {
            Some(kind) => self.flatten_nested_stack(kind, name, def, ctx),
            None => Err(StackError::UnsupportedResource(resource_type.to_string())),
        }
    }

    fn flatten_nested_stack(
        &self,
        kind: NestedStackKind,
        name: &str,
        def: &ResourceDef,
        ctx: &RewriteContext,
    ) -> StackResult<Vec<(String, ResourceDef)>> {
        let master = ctx.master_template_location().ok_or_else(|| {
            StackError::Config(format!(
                "master template location is required when flattening nested {} {}",
                kind, name
            ))
        })?;

        let location = def
            .property(LOCATION)
            .and_then(Value::as_str)
            .unwrap_or_default();
        if !location.ends_with(NESTED_TEMPLATE_EXTENSION) {
            return Err(StackError::Config(format!(
                "nested template location of {} should end with {}, got {:?}",
                name, NESTED_TEMPLATE_EXTENSION, location
            )));
        }

        let parameter_bindings = match def.property(PARAMETERS) {
            None | Some(Value::Null) => Mapping::new(),
            Some(Value::Mapping(parameters)) => parameters.clone(),
            Some(_) => {
                return Err(StackError::Config(format!(
                    "Parameters of nested {} {} must be a mapping",
                    kind, name
                )))
            }
        };

        let nested_path = resolve_location(master, location)?;
        debug!("Inlining {} {} from {}", kind, name, nested_path.display());

        let nested = Template::load(&self.loader, &nested_path)?;
        let nested_ctx = RewriteContext::nested(nested_path, parameter_bindings, name);
        self.process_resources(&nested, &nested_ctx)
    }

    fn sanitize_resource(
        &self,
        name: &str,
        def: &ResourceDef,
        ctx: &RewriteContext,
    ) -> StackResult<(String, ResourceDef)> {
        let final_name = ctx.prefixed(name);
        let rewritten = self.rewriter.rewrite_resource(def, ctx)?;
        if final_name != name {
            debug!("Renamed {} to {}", name, final_name);
        }
        Ok((final_name, rewritten))
    }
}

/// Resolve a nested `Location` against the referencing template's directory.
fn resolve_location(master: &Path, location: &str) -> StackResult<PathBuf> {
    let joined = master
        .parent()
        .map(|dir| dir.join(location))
        .unwrap_or_else(|| PathBuf::from(location));

    let absolute = if joined.is_absolute() {
        joined
    } else {
        std::env::current_dir()
            .map_err(|e| DocumentError::from_io(".", e))?
            .join(joined)
    };

    Ok(normalize(&absolute))
}

/// Lexically drop `.` and resolve `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackfold_yaml::LoadScope;

    fn template(text: &str) -> Template {
        let doc = TemplateLoader::new()
            .load_str(text, &LoadScope::default())
            .unwrap();
        Template::from_value(doc).unwrap()
    }

    fn resource(text: &str) -> ResourceDef {
        template(&format!("Resources:\n  R:\n{}", text))
            .resources()
            .unwrap()
            .remove(0)
            .1
    }

    #[test]
    fn test_needs_flattening() {
        assert!(needs_flattening(&resource(
            "    Type: AWS::CloudFormation::Stack\n    Properties:\n      Location: child.yaml\n"
        )));
        assert!(needs_flattening(&resource(
            "    Type: AWS::Serverless::Application\n    Properties:\n      Location: ./app/template.yaml\n"
        )));
        assert!(!needs_flattening(&resource(
            "    Type: AWS::CloudFormation::Stack\n    Properties:\n      TemplateURL: https://x/child.yaml\n"
        )));
        assert!(!needs_flattening(&resource(
            "    Type: AWS::Serverless::Application\n    Properties:\n      Location:\n        ApplicationId: arn\n"
        )));
        assert!(!needs_flattening(&resource(
            "    Type: AWS::CloudFormation::Stack\n    Properties:\n      Location: child.json\n"
        )));
        assert!(!needs_flattening(&resource(
            "    Type: AWS::S3::Bucket\n    Properties:\n      Location: child.yaml\n"
        )));
    }

    #[test]
    fn test_nested_stack_without_master_location_is_config_error() {
        let t = template(
            "Resources:\n  Child:\n    Type: AWS::CloudFormation::Stack\n    Properties:\n      Location: child.yaml\n",
        );
        let err = Flattener::default()
            .process_resources(&t, &RewriteContext::default())
            .unwrap_err();
        assert!(matches!(err, StackError::Config(_)));
    }

    #[test]
    fn test_location_without_yaml_suffix_is_config_error() {
        let def = resource(
            "    Type: AWS::CloudFormation::Stack\n    Properties:\n      Location: child.json\n",
        );
        let err = Flattener::default()
            .flatten_nested_stack(
                NestedStackKind::CloudFormationStack,
                "R",
                &def,
                &RewriteContext::root("/tmp/root.yaml"),
            )
            .unwrap_err();
        assert!(matches!(err, StackError::Config(_)));
    }

    #[test]
    fn test_non_mapping_parameters_is_config_error() {
        let def = resource(
            "    Type: AWS::CloudFormation::Stack\n    Properties:\n      Location: child.yaml\n      Parameters: [Env]\n",
        );
        let err = Flattener::default()
            .flatten_nested_stack(
                NestedStackKind::CloudFormationStack,
                "R",
                &def,
                &RewriteContext::root("/tmp/root.yaml"),
            )
            .unwrap_err();
        assert!(matches!(err, StackError::Config(_)));
    }

    #[test]
    fn test_unclassified_type_is_unsupported() {
        let def = resource("    Type: AWS::S3::Bucket\n");
        let err = Flattener::default()
            .flatten_resource("R", &def, &RewriteContext::root("/tmp/root.yaml"))
            .unwrap_err();
        assert!(matches!(err, StackError::UnsupportedResource(_)));
    }

    #[test]
    fn test_resolve_location_normalizes() {
        let resolved =
            resolve_location(Path::new("/work/stacks/root.yaml"), "../shared/./db.yaml").unwrap();
        assert_eq!(resolved, PathBuf::from("/work/shared/db.yaml"));
    }

    #[test]
    fn test_resolve_location_relative_master_is_absolute() {
        let resolved = resolve_location(Path::new("root.yaml"), "child.yaml").unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("child.yaml"));
    }
}
