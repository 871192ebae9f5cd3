//! Value utilities between flat form values and nested JSON payloads

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Minimal field shape consumed from the schema compiler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Field name; may be a path such as `items[0].price`
    pub name: String,
    /// Input type (`text`, `number`, `select`, ...)
    pub input_type: String,
    /// Whether the field is currently shown
    #[serde(default = "visible")]
    pub is_visible: bool,
    /// Schema default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

fn visible() -> bool {
    true
}

impl FieldDescriptor {
    /// Create visible field
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, input_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input_type: input_type.into(),
            is_visible: true,
            default: None,
        }
    }

    /// Mark field hidden
    #[inline]
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.is_visible = false;
        self
    }

    /// With schema default
    #[inline]
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Split `items[0].price` into `["items", "0", "price"]`
fn segments(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    for ch in path.chars() {
        match ch {
            '.' | '[' | ']' => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Largest index written as an array slot; bigger numbers become object keys
pub const MAX_ARRAY_INDEX: usize = 10_000;

fn array_index(key: &str) -> Option<usize> {
    key.parse::<usize>()
        .ok()
        .filter(|index| *index <= MAX_ARRAY_INDEX)
}

fn container_for(next: &str) -> Value {
    if array_index(next).is_some() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

fn child<'a>(node: &'a mut Value, key: &str, make: impl FnOnce() -> Value) -> &'a mut Value {
    let index = array_index(key)
        .filter(|_| node.is_array())
        .and_then(|index| Some((index, index.checked_add(1)?)));
    if index.is_none() && !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match (node, index) {
        (Value::Array(items), Some((index, len))) => {
            if items.len() < len {
                items.resize(len, Value::Null);
            }
            let slot = &mut items[index];
            if slot.is_null() {
                *slot = make();
            }
            slot
        }
        (Value::Object(map), _) => map.entry(key).or_insert_with(make),
        (other, _) => other,
    }
}

/// Assign `value` at `path` inside `target`
///
/// Missing intermediate nodes are created: an array when the next segment
/// is an index up to [`MAX_ARRAY_INDEX`], an object otherwise.
pub fn set_deep(target: &mut Value, path: &str, value: Value) {
    let segments = segments(path);
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut node = target;
    for (i, key) in parents.iter().enumerate() {
        let next = &segments[i + 1];
        node = child(node, key, || container_for(next));
    }
    *child(node, last, || Value::Null) = value;
}

fn parse_number(raw: &str) -> Option<Number> {
    if let Ok(int) = raw.trim().parse::<i64>() {
        return Some(Number::from(int));
    }
    raw.trim().parse::<f64>().ok().and_then(Number::from_f64)
}

fn transform(input_type: &str, value: Value) -> Value {
    match (input_type, value) {
        ("number" | "money", Value::String(raw)) if !raw.is_empty() => {
            parse_number(&raw).map_or(Value::String(raw), Value::Number)
        }
        (_, value) => value,
    }
}

/// Convert flat form values into the nested JSON payload
///
/// Numeric fields are parsed, empty strings and hidden fields are omitted,
/// and fields without a value are skipped.
#[must_use]
pub fn to_json_values(values: &Map<String, Value>, fields: &[FieldDescriptor]) -> Value {
    let mut payload = Value::Object(Map::new());
    for field in fields {
        let Some(raw) = values.get(&field.name) else {
            continue;
        };
        let value = transform(&field.input_type, raw.clone());
        if value.as_str() == Some("") || !field.is_visible {
            continue;
        }
        set_deep(&mut payload, &field.name, value);
    }
    payload
}

/// Initial values for the given fields
///
/// Takes the initial value, else the schema default, else an empty string.
/// `null` counts as absent.
#[must_use]
pub fn default_values(
    fields: &[FieldDescriptor],
    initial: &Map<String, Value>,
) -> Map<String, Value> {
    fields
        .iter()
        .map(|field| {
            let value = initial
                .get(&field.name)
                .filter(|value| !value.is_null())
                .or_else(|| field.default.as_ref().filter(|value| !value.is_null()))
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()));
            (field.name.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn map(raw: Value) -> Map<String, Value> {
        match raw {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn segments_split_dots_and_indexes() {
        assert_eq!(segments("items[0].price"), vec!["items", "0", "price"]);
        assert_eq!(segments("a.b"), vec!["a", "b"]);
        assert_eq!(segments("grid[1][2]"), vec!["grid", "1", "2"]);
        assert!(segments("").is_empty());
    }

    #[test]
    fn set_deep_creates_objects_and_arrays() {
        let mut target = json!({});
        set_deep(&mut target, "user.name", json!("Ada"));
        set_deep(&mut target, "items[1].price", json!(9.5));

        assert_eq!(
            target,
            json!({
                "user": {"name": "Ada"},
                "items": [null, {"price": 9.5}]
            })
        );
    }

    #[test]
    fn set_deep_overwrites_existing_leaf() {
        let mut target = json!({"a": {"b": 1}});
        set_deep(&mut target, "a.b", json!(2));
        set_deep(&mut target, "a.c", json!(3));
        assert_eq!(target, json!({"a": {"b": 2, "c": 3}}));
    }

    #[test]
    fn numeric_key_on_object_stays_a_key() {
        let mut target = json!({"a": {}});
        set_deep(&mut target, "a.0", json!(true));
        assert_eq!(target, json!({"a": {"0": true}}));
    }

    #[test]
    fn oversized_index_becomes_object_key() {
        let mut target = json!({});
        set_deep(&mut target, "items[18446744073709551615]", json!(1));
        assert_eq!(target, json!({"items": {"18446744073709551615": 1}}));

        let mut target = json!({});
        set_deep(&mut target, "rows[100000000000].qty", json!(2));
        assert_eq!(target, json!({"rows": {"100000000000": {"qty": 2}}}));
    }

    #[test]
    fn index_at_limit_is_an_array_slot() {
        let mut target = json!({});
        let path = format!("items[{MAX_ARRAY_INDEX}]");
        set_deep(&mut target, &path, json!(true));
        let items = target["items"].as_array().unwrap();
        assert_eq!(items.len(), MAX_ARRAY_INDEX + 1);
        assert_eq!(items[MAX_ARRAY_INDEX], json!(true));
    }

    #[test]
    fn oversized_index_in_field_name_is_kept() {
        let name = "rows[18446744073709551615].qty";
        let fields = vec![FieldDescriptor::new(name, "number")];
        let values = Map::from_iter([(name.to_string(), json!("3"))]);
        assert_eq!(
            to_json_values(&values, &fields),
            json!({"rows": {"18446744073709551615": {"qty": 3}}})
        );
    }

    #[test]
    fn json_values_transform_and_omit() {
        let fields = vec![
            FieldDescriptor::new("name", "text"),
            FieldDescriptor::new("team_size", "number"),
            FieldDescriptor::new("budget", "money"),
            FieldDescriptor::new("age", "number"),
            FieldDescriptor::new("pet_name", "text").hidden(),
            FieldDescriptor::new("address.city", "text"),
            FieldDescriptor::new("missing", "text"),
        ];
        let values = map(json!({
            "name": "Ada",
            "team_size": "12",
            "budget": "99.5",
            "age": "",
            "pet_name": "Rex",
            "address.city": "Lima"
        }));

        assert_eq!(
            to_json_values(&values, &fields),
            json!({
                "name": "Ada",
                "team_size": 12,
                "budget": 99.5,
                "address": {"city": "Lima"}
            })
        );
    }

    #[test]
    fn unparsable_number_is_kept_as_text() {
        let fields = vec![FieldDescriptor::new("n", "number")];
        let values = map(json!({"n": "abc"}));
        assert_eq!(to_json_values(&values, &fields), json!({"n": "abc"}));
    }

    #[test]
    fn defaults_prefer_initial_then_schema() {
        let fields = vec![
            FieldDescriptor::new("a", "text").with_default("schema"),
            FieldDescriptor::new("b", "text").with_default("schema"),
            FieldDescriptor::new("c", "checkbox").with_default(true),
            FieldDescriptor::new("d", "text"),
        ];
        let initial = map(json!({"a": "given", "c": false, "d": null}));

        assert_eq!(
            Value::Object(default_values(&fields, &initial)),
            json!({"a": "given", "b": "schema", "c": false, "d": ""})
        );
    }

    #[test]
    fn descriptor_deserializes_camel_case() {
        let raw = json!({"name": "x", "inputType": "number"});
        let field: FieldDescriptor = serde_json::from_value(raw).unwrap();
        assert!(field.is_visible);
        assert_eq!(field.input_type, "number");
    }

    fn segment() -> impl Strategy<Value = String> {
        let index = prop_oneof![0usize..4, any::<usize>()];
        prop_oneof![
            "[a-z]{1,6}".prop_map(|key| format!(".{key}")),
            index.prop_map(|index| format!("[{index}]")),
        ]
    }

    proptest! {
        #[test]
        fn set_deep_value_is_reachable(
            head in "[a-z]{1,6}",
            rest in prop::collection::vec(segment(), 0..4),
            leaf in any::<i64>()
        ) {
            let path = format!("{head}{}", rest.concat());
            let mut target = json!({});
            set_deep(&mut target, &path, json!(leaf));

            let pointer = format!("/{}", segments(&path).join("/"));
            prop_assert_eq!(target.pointer(&pointer), Some(&json!(leaf)));
        }

        #[test]
        fn json_values_place_every_visible_field(
            head in "[a-z]{1,6}",
            rest in prop::collection::vec(segment(), 0..4),
            text in "[a-z]{1,8}"
        ) {
            let name = format!("{head}{}", rest.concat());
            let fields = vec![FieldDescriptor::new(name.clone(), "text")];
            let values = Map::from_iter([(name.clone(), json!(text))]);

            let payload = to_json_values(&values, &fields);
            let pointer = format!("/{}", segments(&name).join("/"));
            prop_assert_eq!(payload.pointer(&pointer), Some(&json!(text)));
        }
    }
}
