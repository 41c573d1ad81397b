//! Load-time macro resolution.

use std::fs;

use serde_yaml::Value;
use tracing::debug;
use uuid::Uuid;

use crate::catalog::MacroTag;
use crate::error::{DocumentError, DocumentResult};
use crate::loader::{parse_document, LoadScope};
use crate::plain::to_plain_data;

/// Resolves a macro tag to the plain value that replaces it.
pub trait MacroResolver: Send + Sync {
    fn resolve(&self, tag: MacroTag, argument: &str, scope: &LoadScope) -> DocumentResult<Value>;
}

/// Default resolver backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileMacros;

impl FileMacros {
    fn read(
        &self,
        tag: MacroTag,
        argument: &str,
        scope: &LoadScope,
    ) -> DocumentResult<(String, LoadScope)> {
        if argument.trim().is_empty() {
            return Err(DocumentError::Macro {
                tag: tag.yaml_tag().to_string(),
                message: "missing file path".to_string(),
            });
        }
        let path = scope.resolve(argument.trim());
        debug!("Including {:?}", path);
        let content = fs::read_to_string(&path).map_err(|e| DocumentError::from_io(&path, e))?;
        Ok((content, LoadScope::for_file(&path)))
    }
}

impl MacroResolver for FileMacros {
    fn resolve(&self, tag: MacroTag, argument: &str, scope: &LoadScope) -> DocumentResult<Value> {
        match tag {
            MacroTag::IncludeString => {
                let (content, _) = self.read(tag, argument, scope)?;
                Ok(Value::String(content))
            }
            MacroTag::IncludeJsonStringFromYamlFile => {
                let (content, included_scope) = self.read(tag, argument, scope)?;
                let document = parse_document(&content, &included_scope, Some(self))?;
                let json = serde_json::to_string(&to_plain_data(&document)?)?;
                Ok(Value::String(json))
            }
            MacroTag::GenerateUuid => Ok(Value::String(Uuid::new_v4().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_include_string_relative_to_scope() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("policy.txt"), "hello").unwrap();

        let value = FileMacros
            .resolve(MacroTag::IncludeString, "policy.txt", &LoadScope::new(dir.path()))
            .unwrap();
        assert_eq!(value, Value::String("hello".to_string()));
    }

    #[test]
    fn test_include_json_uses_included_file_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("conf")).unwrap();
        fs::write(dir.path().join("conf/inner.txt"), "inner").unwrap();
        fs::write(
            dir.path().join("conf/data.yaml"),
            "name: demo\nbody: !Macro::IncludeString inner.txt\nref: !Ref Thing\n",
        )
        .unwrap();

        let value = FileMacros
            .resolve(
                MacroTag::IncludeJsonStringFromYamlFile,
                "conf/data.yaml",
                &LoadScope::new(dir.path()),
            )
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(value.as_str().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "demo", "body": "inner", "ref": {"Ref": "Thing"}})
        );
    }

    #[test]
    fn test_generate_uuid_is_fresh() {
        let scope = LoadScope::default();
        let a = FileMacros.resolve(MacroTag::GenerateUuid, "", &scope).unwrap();
        let b = FileMacros.resolve(MacroTag::GenerateUuid, "", &scope).unwrap();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_missing_include_is_not_found() {
        let dir = tempdir().unwrap();
        let err = FileMacros
            .resolve(MacroTag::IncludeString, "nope.txt", &LoadScope::new(dir.path()))
            .unwrap_err();
        assert!(matches!(err, DocumentError::NotFound(_)));
    }
}
