//! Deletion-policy marking for stateful resources.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::error::StackResult;
use crate::template::Template;

/// Resource types that hold state worth keeping when a stack is deleted.
pub const STATEFUL_RESOURCE_TYPES: [&str; 8] = [
    "AWS::DynamoDB::Table",
    "AWS::Cognito::UserPool",
    "AWS::Cognito::IdentityPool",
    "AWS::S3::Bucket",
    "AWS::Glue::Database",
    "AWS::Glue::Table",
    "AWS::SQS::Queue",
    "AWS::Kinesis::Stream",
];

/// Default deletion policy applied to stateful resources.
pub const RETAIN_POLICY: &str = "Retain";

/// Applies a deletion policy to every stateful resource of a template.
#[derive(Debug, Clone)]
pub struct RetentionMarker {
    stateful_types: HashSet<String>,
    deletion_policy: String,
}

impl RetentionMarker {
    /// The fixed stateful set with the `Retain` policy.
    pub fn standard() -> Self {
        Self {
            stateful_types: STATEFUL_RESOURCE_TYPES.iter().map(|t| t.to_string()).collect(),
            deletion_policy: RETAIN_POLICY.to_string(),
        }
    }

    /// Treat additional resource types as stateful.
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stateful_types.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn with_deletion_policy(mut self, policy: impl Into<String>) -> Self {
        self.deletion_policy = policy.into();
        self
    }

    pub fn is_stateful(&self, resource_type: &str) -> bool {
        self.stateful_types.contains(resource_type)
    }

    /// Return a copy of `template` with stateful resources marked.
    ///
    /// Only the top-level `Resources` mapping is considered.
    pub fn mark(&self, template: &Template) -> StackResult<Template> {
        let mut marked = 0;
        let resources: Vec<_> = template
            .resources()?
            .into_iter()
            .map(|(name, mut def)| {
                if def.resource_type().is_some_and(|t| self.is_stateful(t)) {
                    debug!("Marking {} with DeletionPolicy {}", name, self.deletion_policy);
                    def.set_deletion_policy(self.deletion_policy.as_str());
                    marked += 1;
                }
                (name, def)
            })
            .collect();

        let mut retained = template.clone();
        retained.set_resources(resources);

        info!("Marked {} resources with DeletionPolicy {}", marked, self.deletion_policy);
        Ok(retained)
    }
}

impl Default for RetentionMarker {
    fn default() -> Self {
        Self::standard()
    }
}

/// Mark the fixed set of stateful resource types with `Retain`.
pub fn mark_retained(template: &Template) -> StackResult<Template> {
    RetentionMarker::standard().mark(template)
}
