//! Structural type inference for JSON payloads.

use bytes::Bytes;
use frog_core::{DecodeError, ScalarType, TypeSignature};
use serde_json::Value;

/// Infer the structural signature of a decoded JSON value.
///
/// Objects map each key to the signature of its value, `null` becomes the
/// wildcard, and every other value collapses to its scalar tag. Arrays are
/// tagged `array` without looking at their elements.
pub fn infer(value: &Value) -> TypeSignature {
    match value {
        Value::Null => TypeSignature::Wildcard,
        Value::Bool(_) => TypeSignature::Scalar(ScalarType::Boolean),
        Value::Number(_) => TypeSignature::Scalar(ScalarType::Number),
        Value::String(_) => TypeSignature::Scalar(ScalarType::String),
        Value::Array(_) => TypeSignature::Scalar(ScalarType::Array),
        Value::Object(map) => TypeSignature::Object(
            map.iter().map(|(k, v)| (k.clone(), infer(v))).collect(),
        ),
    }
}

/// Decode `bytes` as JSON and infer its signature.
///
/// Anything serde_json rejects (including documents nested deeper than its
/// recursion limit) comes back as a [`DecodeError`] holding the raw bytes.
pub fn infer_bytes(bytes: &Bytes) -> Result<TypeSignature, DecodeError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| DecodeError::from_json(&e, bytes.clone()))?;
    Ok(infer(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use frog_core::PayloadSide;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn infers_nested_objects() {
        let sig = infer(&json!({
            "id": "o-1",
            "total": 12.5,
            "paid": false,
            "lines": [1, 2],
            "coupon": null,
            "customer": {"email": "a@b.c", "age": 31}
        }));

        assert_eq!(
            serde_json::to_value(&sig).unwrap(),
            json!({
                "id": "string",
                "total": "number",
                "paid": "boolean",
                "lines": "array",
                "coupon": "*",
                "customer": {"email": "string", "age": "number"}
            })
        );
    }

    #[test]
    fn arrays_are_not_descended_into() {
        let a = infer(&json!({"xs": [1, 2, 3]}));
        let b = infer(&json!({"xs": [{"nested": true}, "mixed"]}));
        assert_eq!(a, b);
    }

    #[test]
    fn inference_is_deterministic_and_order_insensitive() {
        let a = Bytes::from_static(br#"{"b": 1, "a": {"y": null, "x": "s"}}"#);
        let b = Bytes::from_static(br#"{"a": {"x": "t", "y": null}, "b": 2}"#);

        assert_eq!(infer_bytes(&a).unwrap(), infer_bytes(&a).unwrap());
        assert_eq!(infer_bytes(&a).unwrap(), infer_bytes(&b).unwrap());
    }

    #[test]
    fn top_level_scalars_are_accepted() {
        assert_eq!(
            infer_bytes(&Bytes::from_static(b"42")).unwrap(),
            TypeSignature::Scalar(ScalarType::Number)
        );
        assert_eq!(
            infer_bytes(&Bytes::from_static(b"null")).unwrap(),
            TypeSignature::Wildcard
        );
    }

    #[test]
    fn malformed_input_is_a_decode_error() {
        let body = Bytes::from_static(b"{\"id\": ");
        let err = infer_bytes(&body).unwrap_err();

        assert_eq!(err.bytes, body);
        assert_eq!(err.side, PayloadSide::Current);
        assert!(!err.message.is_empty());

        assert!(infer_bytes(&Bytes::new()).is_err());
        assert!(infer_bytes(&Bytes::from_static(b"\xff\xfe")).is_err());
    }

    #[test]
    fn very_deep_documents_fail_cleanly() {
        let depth = 1000;
        let mut raw = String::new();
        for _ in 0..depth {
            raw.push_str("{\"a\":");
        }
        raw.push('1');
        for _ in 0..depth {
            raw.push('}');
        }
        assert!(infer_bytes(&Bytes::from(raw)).is_err());
    }
}
