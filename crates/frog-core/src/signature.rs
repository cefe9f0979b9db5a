use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wire spelling of the wildcard tag.
pub const WILDCARD: &str = "*";

// ============================================================================
// Scalar Types
// ============================================================================

/// Leaf types a payload field can take. Arrays are not descended into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Number,
    Boolean,
    Array,
}

impl ScalarType {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Number => "number",
            ScalarType::Boolean => "boolean",
            ScalarType::Array => "array",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "string" => Some(ScalarType::String),
            "number" => Some(ScalarType::Number),
            "boolean" => Some(ScalarType::Boolean),
            "array" => Some(ScalarType::Array),
            _ => None,
        }
    }
}

// ============================================================================
// Type Signature
// ============================================================================

/// Structural type of a JSON payload.
///
/// Serializes the way reports store it: objects as maps, scalars as their
/// tag name, and null-derived fields as `"*"`:
///
/// ```json
/// {"id": "string", "total": "number", "customer": {"email": "*"}}
/// ```
///
/// Object fields are kept in a `BTreeMap`, so two signatures compare equal
/// regardless of the key order of the documents they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSignature {
    /// The value was `null`: optional, any type.
    Wildcard,
    Scalar(ScalarType),
    Object(BTreeMap<String, TypeSignature>),
}

impl TypeSignature {
    /// Tag used when this signature appears on one side of a diff.
    pub fn tag(&self) -> TypeTag {
        match self {
            TypeSignature::Wildcard => TypeTag::Wildcard,
            TypeSignature::Scalar(s) => TypeTag::from(*s),
            TypeSignature::Object(_) => TypeTag::Object,
        }
    }

    #[inline]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, TypeSignature::Wildcard)
    }

    /// Number of leaf fields, counting through nested objects.
    pub fn leaf_count(&self) -> usize {
        match self {
            TypeSignature::Object(fields) => {
                fields.values().map(TypeSignature::leaf_count).sum()
            }
            _ => 1,
        }
    }
}

impl Serialize for TypeSignature {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match self {
            TypeSignature::Wildcard => serializer.serialize_str(WILDCARD),
            TypeSignature::Scalar(s) => serializer.serialize_str(s.as_str()),
            TypeSignature::Object(fields) => fields.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for TypeSignature {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Tag(String),
            Object(BTreeMap<String, TypeSignature>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Object(fields) => Ok(TypeSignature::Object(fields)),
            Repr::Tag(tag) if tag == WILDCARD => Ok(TypeSignature::Wildcard),
            Repr::Tag(tag) => ScalarType::from_str(&tag)
                .map(TypeSignature::Scalar)
                .ok_or_else(|| {
                    serde::de::Error::unknown_variant(
                        &tag,
                        &["*", "string", "number", "boolean", "array"],
                    )
                }),
        }
    }
}

// ============================================================================
// Diff Entries
// ============================================================================

/// One side of a field diff: a signature tag, or `missing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    String,
    Number,
    Boolean,
    Array,
    Object,
    #[serde(rename = "*")]
    Wildcard,
    Missing,
}

impl TypeTag {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Boolean => "boolean",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
            TypeTag::Wildcard => WILDCARD,
            TypeTag::Missing => "missing",
        }
    }
}

impl From<ScalarType> for TypeTag {
    fn from(s: ScalarType) -> Self {
        match s {
            ScalarType::String => TypeTag::String,
            ScalarType::Number => TypeTag::Number,
            ScalarType::Boolean => TypeTag::Boolean,
            ScalarType::Array => TypeTag::Array,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field whose type changed (or vanished) between two payloads.
///
/// `path` is dotted from the document root, e.g. `.customer.email`.
/// `side_a` is the earlier payload, `side_b` the later one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDiff {
    pub path: String,
    pub side_a: TypeTag,
    pub side_b: TypeTag,
}

impl FieldDiff {
    pub fn new(path: impl Into<String>, side_a: TypeTag, side_b: TypeTag) -> Self {
        Self {
            path: path.into(),
            side_a,
            side_b,
        }
    }
}

impl fmt::Display for FieldDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.path, self.side_a, self.side_b)
    }
}
