//! Tagged-node model.
//!
//! A [`TaggedNode`] is the typed view of one `!Tag payload` occurrence in a
//! document. The document tree itself stays a [`serde_yaml::Value`], where
//! tags live as [`Value::Tagged`]; [`TaggedNode::from_tagged`] builds the
//! typed view and [`TaggedNode::represent`] writes it back.

use serde_yaml::value::{Tag as YamlTag, TaggedValue};
use serde_yaml::{Mapping, Value};

use crate::catalog::{Intrinsic, NodeKind, Tag};
use crate::error::{DocumentError, DocumentResult};
use crate::plain;

/// Concrete payload of a tagged node.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Scalar(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl Payload {
    fn into_value(self) -> Value {
        match self {
            Self::Scalar(s) => Value::String(s),
            Self::Sequence(items) => Value::Sequence(items),
            Self::Mapping(map) => Value::Mapping(map),
        }
    }
}

/// An intrinsic function (or unevaluated macro) embedded in a document.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedNode {
    tag: Tag,
    payload: Payload,
}

impl TaggedNode {
    pub fn new(tag: Tag, payload: Payload) -> Self {
        Self { tag, payload }
    }

    /// Build a node from a raw payload according to the tag's [`NodeKind`].
    ///
    /// Dual kinds try the structured shape first and fall back to a scalar.
    pub fn construct(tag: Tag, raw: &Value) -> DocumentResult<Self> {
        let kind = tag.kind();
        let payload = match kind {
            NodeKind::Scalar => Payload::Scalar(construct_scalar(tag, kind, raw)?),
            NodeKind::Sequence => Payload::Sequence(construct_sequence(tag, kind, raw)?),
            NodeKind::Mapping => Payload::Mapping(construct_mapping(tag, kind, raw)?),
            NodeKind::SequenceOrScalar => match construct_sequence(tag, kind, raw) {
                Ok(items) => Payload::Sequence(items),
                Err(_) => Payload::Scalar(construct_scalar(tag, kind, raw)?),
            },
            NodeKind::MappingOrScalar => match construct_mapping(tag, kind, raw) {
                Ok(map) => Payload::Mapping(map),
                Err(_) => Payload::Scalar(construct_scalar(tag, kind, raw)?),
            },
        };
        Ok(Self { tag, payload })
    }

    /// Build a node from a parsed `serde_yaml` tagged value.
    pub fn from_tagged(tagged: &TaggedValue) -> DocumentResult<Self> {
        let spelled = tagged.tag.to_string();
        let tag = Tag::from_yaml(&spelled).ok_or(DocumentError::UnknownTag(spelled))?;
        Self::construct(tag, &tagged.value)
    }

    /// Emit the node back as a tagged value.
    ///
    /// The emitted shape follows the payload, not the declared kind.
    pub fn represent(&self) -> Value {
        self.clone().into_value()
    }

    pub fn into_value(self) -> Value {
        Value::Tagged(Box::new(TaggedValue {
            tag: YamlTag::new(format!("!{}", self.tag.yaml_tag())),
            value: self.payload.into_value(),
        }))
    }

    /// Plain-data (JSON) form, e.g. `{"Fn::Sub": "..."}`.
    ///
    /// A `Ref` to `X.Y` becomes `{"Fn::GetAtt": ["X", "Y"]}`, and so does a
    /// scalar `GetAtt`.
    pub fn to_plain_data(&self) -> DocumentResult<serde_json::Value> {
        let mut name = self.tag.name();
        let data = match &self.payload {
            Payload::Scalar(s) => match self.tag.intrinsic() {
                Some(Intrinsic::GetAtt) => split_attribute(s),
                Some(Intrinsic::Ref) if s.contains('.') => {
                    name = Intrinsic::GetAtt.name();
                    split_attribute(s)
                }
                _ => serde_json::Value::String(s.clone()),
            },
            Payload::Sequence(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(plain::to_plain_data)
                    .collect::<DocumentResult<Vec<_>>>()?,
            ),
            Payload::Mapping(map) => plain::mapping_to_plain_data(map)?,
        };

        let mut object = serde_json::Map::new();
        object.insert(name.to_string(), data);
        Ok(serde_json::Value::Object(object))
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn intrinsic(&self) -> Option<Intrinsic> {
        self.tag.intrinsic()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }
}

fn split_attribute(s: &str) -> serde_json::Value {
    serde_json::Value::Array(
        s.splitn(2, '.')
            .map(|part| serde_json::Value::String(part.to_string()))
            .collect(),
    )
}

fn shape_error(tag: Tag, kind: NodeKind, raw: &Value) -> DocumentError {
    DocumentError::Shape {
        tag: tag.yaml_tag().to_string(),
        expected: kind.as_str(),
        found: describe(raw),
    }
}

fn construct_scalar(tag: Tag, kind: NodeKind, raw: &Value) -> DocumentResult<String> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        _ => Err(shape_error(tag, kind, raw)),
    }
}

fn construct_sequence(tag: Tag, kind: NodeKind, raw: &Value) -> DocumentResult<Vec<Value>> {
    match raw {
        Value::Sequence(items) => Ok(items.clone()),
        _ => Err(shape_error(tag, kind, raw)),
    }
}

fn construct_mapping(tag: Tag, kind: NodeKind, raw: &Value) -> DocumentResult<Mapping> {
    match raw {
        Value::Mapping(map) => Ok(map.clone()),
        _ => Err(shape_error(tag, kind, raw)),
    }
}

pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) | Value::Number(_) | Value::String(_) => "scalar",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
