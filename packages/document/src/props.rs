use crate::model::Props;
use serde_json::Value;

/// Deep-merge `patch` into `target`.
///
/// Objects merge key by key, recursively. Arrays and scalars replace the
/// previous value atomically. A `null` in the patch removes the key.
pub fn deep_merge(target: &mut Props, patch: &Props) {
    for (key, value) in patch {
        match value {
            Value::Null => {
                target.remove(key);
            }
            Value::Object(patch_obj) => match target.get_mut(key) {
                Some(Value::Object(existing)) => deep_merge(existing, patch_obj),
                _ => {
                    let mut fresh = Props::new();
                    deep_merge(&mut fresh, patch_obj);
                    target.insert(key.clone(), Value::Object(fresh));
                }
            },
            other => {
                target.insert(key.clone(), other.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Props {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_nested_objects_merge() {
        let mut target = props(json!({ "style": { "color": "red", "padding": 4 }, "text": "a" }));
        deep_merge(&mut target, &props(json!({ "style": { "color": "blue" } })));

        assert_eq!(
            Value::Object(target),
            json!({ "style": { "color": "blue", "padding": 4 }, "text": "a" })
        );
    }

    #[test]
    fn test_arrays_replace_atomically() {
        let mut target = props(json!({ "slides": [{ "src": "a" }, { "src": "b" }] }));
        deep_merge(&mut target, &props(json!({ "slides": [{ "src": "c" }] })));

        assert_eq!(Value::Object(target), json!({ "slides": [{ "src": "c" }] }));
    }

    #[test]
    fn test_null_removes_key() {
        let mut target = props(json!({ "originalHtml": "<p>x</p>", "text": "x" }));
        deep_merge(&mut target, &props(json!({ "originalHtml": null })));

        assert_eq!(Value::Object(target), json!({ "text": "x" }));
    }
}
