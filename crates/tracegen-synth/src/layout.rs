//! Object layout expected by the Gson runtime.
//!
//! Captures follow XStream conventions: the root element names the type,
//! child elements are fields, collections and arrays hold one typed element
//! per item, and maps hold `entry` pairs. Gson wants the object's fields as
//! JSON members with no type names, so [`gson_value`] drops the type
//! elements and keeps only the data.
//!
//! Field leaves carry no type information in the capture. They are written
//! as numbers or booleans when the text reads as one and as strings
//! otherwise. Gson's string adapter accepts number and boolean tokens, and
//! generated tests compare re-serialized objects rather than raw fixture
//! text, so the guess never changes what a test observes.

use serde_json::{Map, Number, Value};
use tracegen_snapshot::ObjectNode;

const NUMBER_TYPES: &[&str] = &[
    "int", "long", "short", "byte", "float", "double", "big-int", "big-decimal",
];

const COLLECTION_NAMES: &[&str] = &[
    "list",
    "linked-list",
    "set",
    "sorted-set",
    "tree-set",
    "linked-hash-set",
    "vector",
];

const MAP_NAMES: &[&str] = &["map", "linked-hash-map", "tree-map", "sorted-map", "hashtable"];

/// XStream bookkeeping attributes with no Gson counterpart.
const BOOKKEEPING_ATTRIBUTES: &[&str] = &["class", "defined-in", "resolves-to", "serialization"];

/// Lay out a captured object graph the way Gson reads and writes it.
pub fn gson_value(root: &ObjectNode) -> Value {
    typed_value(root)
}

/// Value of an element whose name is a type (a root or a collection item).
fn typed_value(node: &ObjectNode) -> Value {
    let name = node.name.as_str();
    if name == "null" || node.attribute("reference").is_some() {
        return Value::Null;
    }
    if NUMBER_TYPES.contains(&name) {
        return number(node.text.trim()).unwrap_or_else(|| Value::String(node.text.clone()));
    }
    match name {
        "boolean" => return boolean(node.text.trim()).unwrap_or(Value::String(node.text.clone())),
        "string" | "char" | "java.lang.String" => return Value::String(node.text.clone()),
        _ => {}
    }
    if is_map(node) {
        return map_value(node);
    }
    if is_sequence(node) {
        return Value::Array(node.children.iter().map(typed_value).collect());
    }
    object_value(node)
}

/// Value of an element whose name is a field.
fn field_value(node: &ObjectNode) -> Value {
    if node.attribute("reference").is_some() {
        return Value::Null;
    }
    if is_map(node) {
        return map_value(node);
    }
    if is_sequence(node) {
        return Value::Array(node.children.iter().map(typed_value).collect());
    }
    if node.children.is_empty() {
        return scalar(&node.text);
    }
    object_value(node)
}

fn object_value(node: &ObjectNode) -> Value {
    let mut fields = Map::new();
    for (key, value) in &node.attributes {
        if !BOOKKEEPING_ATTRIBUTES.contains(&key.as_str()) {
            fields.insert(field_name(key), scalar(value));
        }
    }
    for child in &node.children {
        // An empty element is an empty string or an empty collection; the
        // field default stands in for either.
        if child.name == "outer-class" || is_empty_element(child) {
            continue;
        }
        let key = field_name(&child.name);
        let value = field_value(child);
        // Repeated field elements come from implicit collections.
        match fields.get_mut(&key) {
            Some(Value::Array(items)) if child_repeats(node, &child.name) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                let value = if child_repeats(node, &child.name) {
                    Value::Array(vec![value])
                } else {
                    value
                };
                fields.insert(key, value);
            }
        }
    }
    Value::Object(fields)
}

fn is_empty_element(node: &ObjectNode) -> bool {
    node.children.is_empty() && node.attributes.is_empty() && node.text.is_empty()
}

fn child_repeats(parent: &ObjectNode, name: &str) -> bool {
    parent.children.iter().filter(|c| c.name == name).count() > 1
}

fn map_value(node: &ObjectNode) -> Value {
    let mut members = Map::new();
    for entry in node.children.iter().filter(|c| c.name == "entry") {
        let (Some(key), Some(value)) = (entry.children.first(), entry.children.get(1)) else {
            continue;
        };
        let key = match typed_value(key) {
            Value::String(s) => s,
            other => other.to_string(),
        };
        members.insert(key, typed_value(value));
    }
    Value::Object(members)
}

fn is_map(node: &ObjectNode) -> bool {
    MAP_NAMES.contains(&node.name.as_str())
        || node.attribute("class").is_some_and(|c| {
            MAP_NAMES.contains(&c) || (c.starts_with("java.util.") && c.ends_with("Map"))
        })
}

/// Collections, arrays, and fields whose children are all type-named items.
fn is_sequence(node: &ObjectNode) -> bool {
    let name = node.name.as_str();
    if COLLECTION_NAMES.contains(&name) || name.ends_with("-array") {
        return true;
    }
    if let Some(class) = node.attribute("class") {
        if COLLECTION_NAMES.contains(&class) || class.ends_with("-array") {
            return true;
        }
        if class.starts_with("java.util.")
            && ["List", "Set", "Vector", "Deque", "Queue"]
                .iter()
                .any(|suffix| class.ends_with(suffix))
        {
            return true;
        }
    }
    !node.children.is_empty() && node.children.iter().all(|c| is_type_name(&c.name))
}

/// Element names that can only be type names, never Java field names.
fn is_type_name(name: &str) -> bool {
    name.contains('.')
        || name.ends_with("-array")
        || NUMBER_TYPES.contains(&name)
        || matches!(name, "boolean" | "char" | "string" | "null")
}

/// XStream escapes `$` as `_-` and `_` as `__` in element names.
fn field_name(element: &str) -> String {
    element.replace("_-", "$").replace("__", "_")
}

fn scalar(text: &str) -> Value {
    let trimmed = text.trim();
    boolean(trimmed)
        .or_else(|| number(trimmed))
        .unwrap_or_else(|| Value::String(text.to_string()))
}

fn boolean(text: &str) -> Option<Value> {
    match text {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ => None,
    }
}

fn number(text: &str) -> Option<Value> {
    if text.is_empty()
        || !text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
        || !text.chars().any(|c| c.is_ascii_digit())
    {
        return None;
    }
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracegen_snapshot::parse_xml_tree;

    fn layout(xml: &str) -> Value {
        gson_value(&parse_xml_tree(xml).unwrap())
    }

    #[test]
    fn test_boxed_values_are_bare() {
        assert_eq!(layout("<int>3</int>"), json!(3));
        assert_eq!(layout("<double>2.5</double>"), json!(2.5));
        assert_eq!(layout("<boolean>true</boolean>"), json!(true));
        assert_eq!(layout("<string>007</string>"), json!("007"));
        assert_eq!(layout("<null/>"), Value::Null);
    }

    #[test]
    fn test_object_drops_type_name() {
        assert_eq!(
            layout("<a.Calc>\n  <x>1</x>\n  <label>sum</label>\n  <note/>\n  <on>false</on>\n</a.Calc>"),
            json!({"x": 1, "label": "sum", "on": false})
        );
        assert_eq!(layout("<a.Calc/>"), json!({}));
    }

    #[test]
    fn test_params_array_becomes_json_array() {
        assert_eq!(
            layout("<object-array><int>2</int><string>b</string><a.P><v>1</v></a.P></object-array>"),
            json!([2, "b", {"v": 1}])
        );
    }

    #[test]
    fn test_collection_fields() {
        assert_eq!(
            layout(
                r#"<a.Cart><items class="java.util.ArrayList"><string>x</string></items><sizes><int>1</int><int>2</int></sizes><empty class="linked-list"/></a.Cart>"#
            ),
            json!({"items": ["x"], "sizes": [1, 2], "empty": []})
        );
        assert_eq!(layout("<list/>"), json!([]));
    }

    #[test]
    fn test_implicit_collection_repeats_field() {
        assert_eq!(
            layout("<a.Bag><item>1</item><item>2</item><n>x</n></a.Bag>"),
            json!({"item": [1, 2], "n": "x"})
        );
    }

    #[test]
    fn test_maps_become_objects() {
        assert_eq!(
            layout("<map><entry><string>k</string><int>1</int></entry><entry><int>2</int><boolean>true</boolean></entry></map>"),
            json!({"k": 1, "2": true})
        );
    }

    #[test]
    fn test_bookkeeping_is_dropped() {
        assert_eq!(
            layout(
                r#"<a.Outer_-Inner><outer-class><n>1</n></outer-class><my__field>2</my__field><peer reference="../.."/></a.Outer_-Inner>"#
            ),
            json!({"my_field": 2, "peer": null})
        );
    }

    #[test]
    fn test_numbers_are_recognized_strictly() {
        assert_eq!(scalar("12"), json!(12));
        assert_eq!(scalar("-1.5e3"), json!(-1500.0));
        assert_eq!(scalar("e"), json!("e"));
        assert_eq!(scalar("NaN"), json!("NaN"));
        assert_eq!(scalar("1-2"), json!("1-2"));
    }
}
