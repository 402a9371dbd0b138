use serde::Serialize;
use serde_json::Value;

/// JSON shape of a node with identity stripped: every node-level `id` and
/// `version` is removed, props are left intact. Two independently created
/// trees with the same content have equal shapes.
pub fn shape_of<T: Serialize>(node: &T) -> Value {
    let mut value = serde_json::to_value(node).unwrap_or(Value::Null);
    strip(&mut value, false);
    value
}

fn strip(value: &mut Value, inside_props: bool) {
    match value {
        Value::Object(map) => {
            if !inside_props {
                map.remove("id");
                map.remove("version");
            }
            for (key, child) in map.iter_mut() {
                strip(child, inside_props || key == "props");
            }
        }
        Value::Array(items) => {
            for item in items {
                strip(item, inside_props);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strips_identity_but_not_props() {
        let value = json!({
            "id": "s1",
            "version": 4,
            "props": { "id": "anchor" },
            "columns": [{ "id": "c1", "elements": [] }]
        });

        assert_eq!(
            shape_of(&value),
            json!({ "props": { "id": "anchor" }, "columns": [{ "elements": [] }] })
        );
    }
}
