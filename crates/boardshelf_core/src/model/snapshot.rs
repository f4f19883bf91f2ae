//! Canvas snapshot model and fingerprinting.
//!
//! # Responsibility
//! - Hold the opaque per-board drawing payload stored next to the index.
//! - Reduce raw drawing-surface captures to their persisted subset.
//! - Derive comparison fingerprints used to skip redundant writes.
//!
//! # Invariants
//! - A fingerprint depends only on snapshot content, never on key order.
//! - Transient view state (selection, cursor, open menus) is never persisted.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

/// View-state keys that survive into a persisted snapshot.
pub const PERSISTED_APP_STATE_KEYS: &[&str] = &[
    "viewBackgroundColor",
    "gridSize",
    "gridModeEnabled",
    "theme",
    "zoom",
    "scrollX",
    "scrollY",
    "currentItemStrokeColor",
    "currentItemBackgroundColor",
    "currentItemFillStyle",
    "currentItemStrokeWidth",
    "currentItemStrokeStyle",
    "currentItemRoughness",
    "currentItemOpacity",
    "currentItemFontFamily",
    "currentItemFontSize",
    "currentItemTextAlign",
    "currentItemRoundness",
    "currentItemArrowType",
];

/// Serialized drawing content of one board.
///
/// The payload is owned by the drawing surface; core only stores, compares
/// and ships it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanvasSnapshot(Value);

impl CanvasSnapshot {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Payload written for a freshly created board.
    pub fn empty() -> Self {
        Self(json!({
            "elements": [],
            "appState": {},
            "files": {},
        }))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Parses stored snapshot text.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text).map(Self)
    }

    pub fn to_json_string(&self) -> String {
        self.0.to_string()
    }

    /// SHA-256 hex digest of the canonical serialization.
    ///
    /// Object keys are sorted while hashing, whatever order the map keeps.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = Sha256::new();
        hash_canonical(&self.0, &mut hasher);
        Fingerprint(hex::encode(hasher.finalize()))
    }
}

fn hash_canonical(value: &Value, hasher: &mut Sha256) {
    match value {
        Value::Array(values) => {
            hasher.update(b"[");
            for (position, item) in values.iter().enumerate() {
                if position > 0 {
                    hasher.update(b",");
                }
                hash_canonical(item, hasher);
            }
            hasher.update(b"]");
        }
        Value::Object(map) => {
            let mut keys = map.keys().collect::<Vec<_>>();
            keys.sort_unstable();
            hasher.update(b"{");
            for (position, key) in keys.into_iter().enumerate() {
                if position > 0 {
                    hasher.update(b",");
                }
                hasher.update(Value::String(key.clone()).to_string().as_bytes());
                hasher.update(b":");
                if let Some(item) = map.get(key) {
                    hash_canonical(item, hasher);
                }
            }
            hasher.update(b"}");
        }
        scalar => hasher.update(scalar.to_string().as_bytes()),
    }
}

/// Comparison key derived from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Raw state pulled from the drawing surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneCapture {
    /// Scene graph elements.
    pub elements: Vec<Value>,
    /// Full view/style state as reported by the surface.
    pub app_state: Map<String, Value>,
    /// Binary assets keyed by file id.
    pub files: Map<String, Value>,
}

impl SceneCapture {
    /// Builds the persisted snapshot, keeping only allow-listed view state.
    pub fn into_snapshot(self) -> CanvasSnapshot {
        let app_state = self
            .app_state
            .into_iter()
            .filter(|(key, _)| PERSISTED_APP_STATE_KEYS.contains(&key.as_str()))
            .collect::<Map<String, Value>>();

        CanvasSnapshot(json!({
            "elements": self.elements,
            "appState": app_state,
            "files": self.files,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::{CanvasSnapshot, SceneCapture};
    use serde_json::{json, Map, Value};

    #[test]
    fn fingerprint_ignores_object_key_order() {
        let first = CanvasSnapshot::from_json_str(r#"{"a":1,"b":{"x":true,"y":[1,2]}}"#).unwrap();
        let second =
            CanvasSnapshot::from_json_str(r#"{"b":{"y":[1,2],"x":true},"a":1}"#).unwrap();
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn fingerprint_ignores_insertion_order_of_built_maps() {
        let mut forward = Map::new();
        forward.insert("zoom".to_string(), json!(1));
        forward.insert("theme".to_string(), json!("dark"));
        let mut backward = Map::new();
        backward.insert("theme".to_string(), json!("dark"));
        backward.insert("zoom".to_string(), json!(1));
        let first = CanvasSnapshot::from_value(json!({ "appState": Value::Object(forward) }));
        let second = CanvasSnapshot::from_value(json!({ "appState": Value::Object(backward) }));
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn nested_key_and_value_boundaries_stay_distinct() {
        let first = CanvasSnapshot::from_value(json!({"a": "b,c"}));
        let second = CanvasSnapshot::from_value(json!({"a": "b", "c": null}));
        assert_ne!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn fingerprint_changes_with_content() {
        let first = CanvasSnapshot::from_value(json!({"elements": [1]}));
        let second = CanvasSnapshot::from_value(json!({"elements": [2]}));
        assert_ne!(first.fingerprint(), second.fingerprint());
        assert_eq!(first.fingerprint().as_str().len(), 64);
    }

    #[test]
    fn capture_drops_transient_view_state() {
        let mut app_state = Map::new();
        app_state.insert("viewBackgroundColor".to_string(), json!("#fff"));
        app_state.insert("selectedElementIds".to_string(), json!({"e1": true}));
        app_state.insert("cursorButton".to_string(), json!("down"));

        let snapshot = SceneCapture {
            elements: vec![json!({"id": "e1"})],
            app_state,
            files: Map::new(),
        }
        .into_snapshot();

        let persisted = snapshot.as_value()["appState"].as_object().unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted["viewBackgroundColor"], Value::from("#fff"));
    }
}
