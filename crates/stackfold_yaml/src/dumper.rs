//! Document serialization.

use serde_yaml::Value;

use crate::error::{DocumentError, DocumentResult};
use crate::plain::to_plain_data;

/// Serialize a document back to the tagged YAML dialect.
pub fn dump_yaml(document: &Value) -> DocumentResult<String> {
    serde_yaml::to_string(document).map_err(DocumentError::Serialize)
}

/// Serialize the plain-data form of a document as pretty JSON.
pub fn dump_json(document: &Value) -> DocumentResult<String> {
    Ok(serde_json::to_string_pretty(&to_plain_data(document)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{LoadScope, TemplateLoader};

    #[test]
    fn test_dump_keeps_tag_spelling() {
        let doc = TemplateLoader::new()
            .load_str(
                "Name: !Sub '${AWS::StackName}-data'\nArn: !GetAtt Bucket.Arn\n",
                &LoadScope::default(),
            )
            .unwrap();
        let yaml = dump_yaml(&doc).unwrap();
        assert!(yaml.contains("!Sub"));
        assert!(yaml.contains("!GetAtt Bucket.Arn"));
    }

    #[test]
    fn test_dump_failure_is_not_a_parse_error() {
        let doc = TemplateLoader::new()
            .load_str("? !Ref Key\n: value\n", &LoadScope::default())
            .unwrap();
        let err = dump_yaml(&doc).unwrap_err();
        assert!(matches!(err, DocumentError::Serialize(_)));
        assert_eq!(err.kind(), crate::ErrorKind::Io);
    }

    #[test]
    fn test_dump_json_canonicalizes() {
        let doc = TemplateLoader::new()
            .load_str("Arn: !Ref Bucket.Arn\n", &LoadScope::default())
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&dump_json(&doc).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"Arn": {"Fn::GetAtt": ["Bucket", "Arn"]}}));
    }
}
