//! Field-level comparison of two type signatures.

use frog_core::{FieldDiff, TypeSignature, TypeTag};

/// Compare `prev` against `next`, walking `prev`'s fields.
///
/// The comparison is one-sided:
/// - a field of `prev` that is absent from `next` is reported as `missing`,
///   unless it was a wildcard in `prev`;
/// - fields that only exist in `next` are never reported;
/// - a wildcard on either side matches anything;
/// - objects are compared field by field, an object against a scalar is a
///   mismatch tagged `object`.
///
/// The result is sorted by path and is empty iff the signatures match.
pub fn diff(prev: &TypeSignature, next: &TypeSignature) -> Vec<FieldDiff> {
    let mut out = Vec::new();
    walk("", prev, next, &mut out);
    out.sort_by(|a, b| a.path.cmp(&b.path));
    out
}

fn walk(
    path: &str,
    prev: &TypeSignature,
    next: &TypeSignature,
    out: &mut Vec<FieldDiff>,
) {
    match (prev, next) {
        (TypeSignature::Wildcard, _) | (_, TypeSignature::Wildcard) => {}
        (TypeSignature::Object(a), TypeSignature::Object(b)) => {
            for (field, prev_field) in a {
                let child = format!("{path}.{field}");
                match b.get(field) {
                    Some(next_field) => walk(&child, prev_field, next_field, out),
                    None if prev_field.is_wildcard() => {}
                    None => out.push(FieldDiff::new(
                        child,
                        prev_field.tag(),
                        TypeTag::Missing,
                    )),
                }
            }
        }
        (a, b) => {
            let (ta, tb) = (a.tag(), b.tag());
            if ta != tb {
                out.push(FieldDiff::new(path, ta, tb));
            }
        }
    }
}
