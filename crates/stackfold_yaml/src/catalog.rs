//! The closed catalog of supported tags.
//!
//! Intrinsic functions become [`TaggedNode`](crate::TaggedNode)s. Macro tags
//! resolve to plain values at load time when macro evaluation is enabled and
//! stay tagged (scalar kind) otherwise.

use std::fmt;

/// Payload shape a tag accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Scalar,
    Sequence,
    SequenceOrScalar,
    Mapping,
    MappingOrScalar,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Sequence => "sequence",
            Self::SequenceOrScalar => "sequence or scalar",
            Self::Mapping => "mapping",
            Self::MappingOrScalar => "mapping or scalar",
        }
    }
}

/// Intrinsic functions understood by the loader and the rewriter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    And,
    Condition,
    Base64,
    Equals,
    FindInMap,
    GetAtt,
    GetAZs,
    If,
    ImportValue,
    Join,
    Not,
    Or,
    Select,
    Split,
    Sub,
    Ref,
}

impl Intrinsic {
    pub const ALL: [Intrinsic; 16] = [
        Self::And,
        Self::Condition,
        Self::Base64,
        Self::Equals,
        Self::FindInMap,
        Self::GetAtt,
        Self::GetAZs,
        Self::If,
        Self::ImportValue,
        Self::Join,
        Self::Not,
        Self::Or,
        Self::Select,
        Self::Split,
        Self::Sub,
        Self::Ref,
    ];

    /// Tag spelling without the leading `!`.
    pub fn yaml_tag(&self) -> &'static str {
        match self {
            Self::And => "And",
            Self::Condition => "Condition",
            Self::Base64 => "Base64",
            Self::Equals => "Equals",
            Self::FindInMap => "FindInMap",
            Self::GetAtt => "GetAtt",
            Self::GetAZs => "GetAZs",
            Self::If => "If",
            Self::ImportValue => "ImportValue",
            Self::Join => "Join",
            Self::Not => "Not",
            Self::Or => "Or",
            Self::Select => "Select",
            Self::Split => "Split",
            Self::Sub => "Sub",
            Self::Ref => "Ref",
        }
    }

    /// Canonical function name used in the plain-data (JSON) form.
    pub fn name(&self) -> &'static str {
        match self {
            Self::And => "Fn::And",
            Self::Condition => "Fn::Condition",
            Self::Base64 => "Fn::Base64",
            Self::Equals => "Fn::Equals",
            Self::FindInMap => "Fn::FindInMap",
            Self::GetAtt => "Fn::GetAtt",
            Self::GetAZs => "Fn::GetAZs",
            Self::If => "Fn::If",
            Self::ImportValue => "Fn::ImportValue",
            Self::Join => "Fn::Join",
            Self::Not => "Fn::Not",
            Self::Or => "Fn::Or",
            Self::Select => "Fn::Select",
            Self::Split => "Fn::Split",
            Self::Sub => "Fn::Sub",
            Self::Ref => "Ref",
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Condition | Self::Base64 | Self::GetAZs | Self::ImportValue | Self::Ref => {
                NodeKind::Scalar
            }
            Self::GetAtt | Self::Sub => NodeKind::SequenceOrScalar,
            Self::And
            | Self::Equals
            | Self::FindInMap
            | Self::If
            | Self::Join
            | Self::Not
            | Self::Or
            | Self::Select
            | Self::Split => NodeKind::Sequence,
        }
    }
}

/// Load-time macros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroTag {
    IncludeString,
    IncludeJsonStringFromYamlFile,
    GenerateUuid,
}

impl MacroTag {
    pub const ALL: [MacroTag; 3] = [
        Self::IncludeString,
        Self::IncludeJsonStringFromYamlFile,
        Self::GenerateUuid,
    ];

    /// Tag spelling without the leading `!`; also the macro's canonical name.
    pub fn yaml_tag(&self) -> &'static str {
        match self {
            Self::IncludeString => "Macro::IncludeString",
            Self::IncludeJsonStringFromYamlFile => "Macro::IncludeJsonStringFromYamlFile",
            Self::GenerateUuid => "Macro::GenerateUUID",
        }
    }

    /// Short alias accepted on input.
    pub fn alias(&self) -> &'static str {
        match self {
            Self::IncludeString => "IncludeString",
            Self::IncludeJsonStringFromYamlFile => "IncludeJsonStringFromYamlFile",
            Self::GenerateUuid => "GenerateUUID",
        }
    }
}

/// Identity of a tagged node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Intrinsic(Intrinsic),
    Macro(MacroTag),
}

impl Tag {
    /// Look up a tag by its YAML spelling. A leading `!` is ignored.
    pub fn from_yaml(tag: &str) -> Option<Self> {
        let tag = tag.trim_start_matches('!');
        if let Some(intrinsic) = Intrinsic::ALL.iter().find(|i| i.yaml_tag() == tag) {
            return Some(Self::Intrinsic(*intrinsic));
        }
        MacroTag::ALL
            .iter()
            .find(|m| m.yaml_tag() == tag || m.alias() == tag)
            .map(|m| Self::Macro(*m))
    }

    pub fn yaml_tag(&self) -> &'static str {
        match self {
            Self::Intrinsic(i) => i.yaml_tag(),
            Self::Macro(m) => m.yaml_tag(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Intrinsic(i) => i.name(),
            Self::Macro(m) => m.yaml_tag(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Intrinsic(i) => i.kind(),
            Self::Macro(_) => NodeKind::Scalar,
        }
    }

    pub fn intrinsic(&self) -> Option<Intrinsic> {
        match self {
            Self::Intrinsic(i) => Some(*i),
            Self::Macro(_) => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!{}", self.yaml_tag())
    }
}
