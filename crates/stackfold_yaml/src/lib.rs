//! # stackfold_yaml
//!
//! The CloudFormation YAML dialect used by stackfold.
//!
//! Intrinsic functions written as tags (`!Ref`, `!Sub`, `!GetAtt`, ...) are
//! kept as structured [`TaggedNode`]s instead of opaque strings, so later
//! passes can find and rewrite references.
//!
//! ## Features
//!
//! - A closed tag catalog with the payload shape each tag accepts
//! - Loading with load-time macros (`!Macro::IncludeString`, ...)
//! - Dumping back to YAML with the same tag spellings
//! - Plain-data (JSON) export with `Ref`/`GetAtt` canonicalization
//!
//! ## Example
//!
//! ```rust,no_run
//! use stackfold_yaml::{dump_yaml, TemplateLoader};
//! use std::path::Path;
//!
//! let loader = TemplateLoader::new().evaluate_macros(true);
//! let document = loader.load_file(Path::new("template.yaml")).unwrap();
//! println!("{}", dump_yaml(&document).unwrap());
//! ```

pub mod catalog;
pub mod dumper;
pub mod error;
pub mod loader;
pub mod macros;
pub mod node;
pub mod plain;

pub use catalog::{Intrinsic, MacroTag, NodeKind, Tag};
pub use dumper::{dump_json, dump_yaml};
pub use error::{DocumentError, DocumentResult, ErrorKind};
pub use loader::{parse_document, LoadScope, TemplateLoader};
pub use macros::{FileMacros, MacroResolver};
pub use node::{Payload, TaggedNode};
pub use plain::{key_to_string, to_plain_data};
