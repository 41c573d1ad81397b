//! # stackfold_core
//!
//! Template transformations for stackfold.
//!
//! This crate turns a CloudFormation template that spreads its resources
//! over nested stacks into one self-contained template, and marks stateful
//! resources so that deleting the stack keeps their data.
//!
//! ## Features
//!
//! - Recursive inlining of `AWS::CloudFormation::Stack` and
//!   `AWS::Serverless::Application` resources that point at local templates
//! - Renaming of inlined resources with the nested stack's name as prefix
//! - Retargeting of `Ref`, `GetAtt` and `Sub` references, honoring the
//!   parameters passed into each nested stack
//! - `DeletionPolicy: Retain` for stateful resource types
//!
//! ## Example
//!
//! ```rust,no_run
//! use stackfold_core::{mark_retained, Flattener};
//! use stackfold_yaml::TemplateLoader;
//! use std::path::Path;
//!
//! let flattener = Flattener::new(TemplateLoader::new().evaluate_macros(true));
//! let template = flattener.flatten(Path::new("template.yaml")).unwrap();
//! let retained = mark_retained(&template).unwrap();
//! println!("{}", retained.to_yaml().unwrap());
//! ```

pub mod context;
pub mod error;
pub mod flatten;
pub mod retain;
pub mod rewrite;
pub mod template;

pub use context::RewriteContext;
pub use error::{StackError, StackResult};
pub use flatten::{needs_flattening, Flattener, NestedStackKind};
pub use retain::{mark_retained, RetentionMarker, RETAIN_POLICY, STATEFUL_RESOURCE_TYPES};
pub use rewrite::ReferenceRewriter;
pub use template::{ResourceDef, Template};
