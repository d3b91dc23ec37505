//! Structural diff between two schema documents.
//!
//! Compares object keys as sets (order-insensitive) and walks shared
//! keys recursively. Pure and deterministic: same inputs, same edits.
//! Removing a key records a single edit at that key's path; the removed
//! subtree is not walked.

use crate::schema::{value_type_name, SchemaDoc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Path separator for nested keys, e.g. `paths./users.get`.
const PATH_SEP: char = '.';

/// What happened at a given path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeKind {
    /// Path existed in the old document, absent in the new one.
    Removed,
    /// Path absent in the old document, present in the new one.
    Added,
    /// Same path, incompatible value type.
    TypeChanged { from: String, to: String },
    /// Same path and type, different value.
    ValueChanged { from: Value, to: Value },
}

/// One edit in a structural diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaChange {
    /// Dotted key path from the document root.
    pub path: String,
    pub kind: ChangeKind,
}

impl SchemaChange {
    /// Path segments, outermost first.
    pub fn segments(&self) -> Vec<&str> {
        self.path.split(PATH_SEP).collect()
    }

    /// Human-readable one-liner for reports and logs.
    pub fn describe(&self) -> String {
        match &self.kind {
            ChangeKind::Removed => format!("removed {}", self.path),
            ChangeKind::Added => format!("added {}", self.path),
            ChangeKind::TypeChanged { from, to } => {
                format!("type of {} changed from {} to {}", self.path, from, to)
            }
            ChangeKind::ValueChanged { from, to } => {
                format!("value of {} changed from {} to {}", self.path, from, to)
            }
        }
    }
}

/// The full set of edits between two documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralDiff {
    pub changes: Vec<SchemaChange>,
}

impl StructuralDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn removed(&self) -> impl Iterator<Item = &SchemaChange> {
        self.changes
            .iter()
            .filter(|c| matches!(c.kind, ChangeKind::Removed))
    }

    pub fn added(&self) -> impl Iterator<Item = &SchemaChange> {
        self.changes
            .iter()
            .filter(|c| matches!(c.kind, ChangeKind::Added))
    }
}

/// Diff two schema documents.
///
/// Never fails: malformed or `null` substructures read as empty objects,
/// so diffing against an empty document yields all-removed or all-added.
pub fn diff(old: &SchemaDoc, new: &SchemaDoc) -> StructuralDiff {
    let mut changes = Vec::new();
    diff_values(&old.0, &new.0, String::new(), &mut changes);
    StructuralDiff { changes }
}

fn diff_values(old: &Value, new: &Value, path: String, out: &mut Vec<SchemaChange>) {
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            let keys: BTreeSet<&String> = old_map.keys().chain(new_map.keys()).collect();
            for key in keys {
                let child_path = join_path(&path, key);
                match (old_map.get(key.as_str()), new_map.get(key.as_str())) {
                    (Some(_), None) => out.push(SchemaChange {
                        path: child_path,
                        kind: ChangeKind::Removed,
                    }),
                    (None, Some(_)) => out.push(SchemaChange {
                        path: child_path,
                        kind: ChangeKind::Added,
                    }),
                    (Some(o), Some(n)) => diff_values(o, n, child_path, out),
                    (None, None) => {}
                }
            }
        }
        // null on either side of a container is treated as empty, not a change
        // in itself: the container's keys surface as added/removed edits.
        (Value::Null, Value::Object(_)) | (Value::Object(_), Value::Null) => {
            let empty = Value::Object(serde_json::Map::new());
            let (o, n) = if old.is_null() {
                (&empty, new)
            } else {
                (old, &empty)
            };
            diff_values(o, n, path, out);
        }
        (Value::Array(old_items), Value::Array(new_items)) => {
            if !arrays_equal_unordered(old_items, new_items) {
                out.push(SchemaChange {
                    path,
                    kind: ChangeKind::ValueChanged {
                        from: old.clone(),
                        to: new.clone(),
                    },
                });
            }
        }
        _ => {
            if value_type_name(old) != value_type_name(new) {
                out.push(SchemaChange {
                    path,
                    kind: ChangeKind::TypeChanged {
                        from: value_type_name(old).to_string(),
                        to: value_type_name(new).to_string(),
                    },
                });
            } else if old != new {
                out.push(SchemaChange {
                    path,
                    kind: ChangeKind::ValueChanged {
                        from: old.clone(),
                        to: new.clone(),
                    },
                });
            }
        }
    }
}

/// Order-insensitive multiset comparison for arrays (path lists, required
/// lists, enum values are all semantically unordered in API specs).
fn arrays_equal_unordered(a: &[Value], b: &[Value]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut remaining: Vec<&Value> = b.iter().collect();
    for item in a {
        match remaining.iter().position(|r| *r == item) {
            Some(idx) => {
                remaining.swap_remove(idx);
            }
            None => return false,
        }
    }
    true
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}{PATH_SEP}{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> SchemaDoc {
        SchemaDoc(v)
    }

    #[test]
    fn test_identical_docs_empty_diff() {
        let s = doc(json!({"paths": {"/users": {"get": {}}}, "info": {"version": "1.0"}}));
        let d = diff(&s, &s.clone());
        assert!(d.is_empty());
    }

    #[test]
    fn test_removed_endpoint() {
        let old = doc(json!({"paths": {"/users": {"get": {}}}}));
        let new = doc(json!({"paths": {}}));
        let d = diff(&old, &new);
        assert_eq!(d.changes.len(), 1);
        assert_eq!(d.changes[0].path, "paths./users");
        assert_eq!(d.changes[0].kind, ChangeKind::Removed);
    }

    #[test]
    fn test_added_endpoint() {
        let old = doc(json!({"paths": {"/users": {"get": {}}}}));
        let new = doc(json!({"paths": {"/users": {"get": {}}, "/products": {"get": {}}}}));
        let d = diff(&old, &new);
        assert_eq!(d.changes.len(), 1);
        assert_eq!(d.changes[0].path, "paths./products");
        assert_eq!(d.changes[0].kind, ChangeKind::Added);
    }

    #[test]
    fn test_type_change() {
        let old = doc(json!({"components": {"schemas": {"User": {"properties": {"id": {"type": "integer"}}}}}}));
        let new = doc(json!({"components": {"schemas": {"User": {"properties": {"id": {"type": "string"}}}}}}));
        let d = diff(&old, &new);
        assert_eq!(d.changes.len(), 1);
        assert_eq!(
            d.changes[0].path,
            "components.schemas.User.properties.id.type"
        );
        assert!(matches!(d.changes[0].kind, ChangeKind::ValueChanged { .. }));
    }

    #[test]
    fn test_scalar_vs_object_is_type_change() {
        let old = doc(json!({"a": {"b": 1}}));
        let new = doc(json!({"a": 1}));
        let d = diff(&old, &new);
        assert_eq!(d.changes.len(), 1);
        assert_eq!(
            d.changes[0].kind,
            ChangeKind::TypeChanged {
                from: "object".to_string(),
                to: "number".to_string()
            }
        );
    }

    #[test]
    fn test_array_order_ignored() {
        let old = doc(json!({"required": ["a", "b"]}));
        let new = doc(json!({"required": ["b", "a"]}));
        assert!(diff(&old, &new).is_empty());
    }

    #[test]
    fn test_array_membership_change_detected() {
        let old = doc(json!({"required": ["a"]}));
        let new = doc(json!({"required": ["a", "b"]}));
        let d = diff(&old, &new);
        assert_eq!(d.changes.len(), 1);
        assert_eq!(d.changes[0].path, "required");
    }

    #[test]
    fn test_empty_old_document_all_added() {
        let old = SchemaDoc::empty();
        let new = doc(json!({"paths": {"/users": {}}, "info": {}}));
        let d = diff(&old, &new);
        assert_eq!(d.added().count(), 2);
        assert_eq!(d.removed().count(), 0);
    }

    #[test]
    fn test_null_substructure_reads_as_empty() {
        let old = doc(json!({"paths": null}));
        let new = doc(json!({"paths": {"/users": {}}}));
        let d = diff(&old, &new);
        assert_eq!(d.changes.len(), 1);
        assert_eq!(d.changes[0].path, "paths./users");
        assert_eq!(d.changes[0].kind, ChangeKind::Added);
    }

    #[test]
    fn test_deterministic_ordering() {
        let old = doc(json!({"b": 1, "a": 1, "c": 1}));
        let new = doc(json!({}));
        let d1 = diff(&old, &new);
        let d2 = diff(&old, &new);
        assert_eq!(d1, d2);
        let paths: Vec<_> = d1.changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["a", "b", "c"]);
    }
}
