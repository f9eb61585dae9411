use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Suffix of the companion field that tells the servlet how to store a value.
pub const TYPE_HINT_SUFFIX: &str = "@TypeHint";
/// Type hint sent for multi-value properties.
pub const MULTI_VALUE_HINT: &str = "String[]";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(true) => f.write_str("true"),
            Scalar::Bool(false) => f.write_str("false"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Scalar(Scalar),
    Array(Vec<Scalar>),
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Scalar(Scalar::String(value.to_string()))
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Scalar(Scalar::String(value))
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Scalar(Scalar::Bool(value))
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Scalar(Scalar::Number(value.into()))
    }
}

impl From<Vec<&str>> for PropertyValue {
    fn from(values: Vec<&str>) -> Self {
        PropertyValue::Array(
            values
                .into_iter()
                .map(|v| Scalar::String(v.to_string()))
                .collect(),
        )
    }
}

/// Properties of a single remote node, ordered by name.
pub type PropertyBag = BTreeMap<String, PropertyValue>;

/// Flattens a bag into form fields.
///
/// Booleans become `"true"`/`"false"`. Every array contributes one field per
/// element plus a `name@TypeHint=String[]` field, unless the bag already
/// carries an explicit hint for that name.
pub fn form_fields(properties: &PropertyBag) -> Vec<(String, String)> {
    let mut fields = Vec::with_capacity(properties.len());
    for (name, value) in properties {
        match value {
            PropertyValue::Scalar(scalar) => fields.push((name.clone(), scalar.to_string())),
            PropertyValue::Array(items) => {
                let hint = format!("{name}{TYPE_HINT_SUFFIX}");
                if !properties.contains_key(&hint) {
                    fields.push((hint, MULTI_VALUE_HINT.to_string()));
                }
                fields.extend(items.iter().map(|item| (name.clone(), item.to_string())));
            }
        }
    }
    fields
}

/// Re-keys every property as `./<file_name>/<key>` so it lands on the file
/// node rather than on its parent.
pub fn namespaced(file_name: &str, properties: &PropertyBag) -> PropertyBag {
    properties
        .iter()
        .map(|(key, value)| (format!("./{file_name}/{key}"), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(entries: Vec<(&str, PropertyValue)>) -> PropertyBag {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn arrays_get_a_type_hint() {
        let fields = form_fields(&bag(vec![("tags", vec!["a", "b"].into())]));
        assert_eq!(
            fields,
            vec![
                ("tags@TypeHint".to_string(), "String[]".to_string()),
                ("tags".to_string(), "a".to_string()),
                ("tags".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn explicit_type_hint_is_kept() {
        let fields = form_fields(&bag(vec![
            ("tags", vec!["a"].into()),
            ("tags@TypeHint", "Name[]".into()),
        ]));
        assert_eq!(
            fields,
            vec![
                ("tags".to_string(), "a".to_string()),
                ("tags@TypeHint".to_string(), "Name[]".to_string()),
            ]
        );
    }

    #[test]
    fn booleans_render_as_literals() {
        let fields = form_fields(&bag(vec![("off", false.into()), ("on", true.into())]));
        assert_eq!(
            fields,
            vec![
                ("off".to_string(), "false".to_string()),
                ("on".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn numbers_keep_their_json_text() {
        let parsed: PropertyBag = serde_json::from_str(r#"{"i": 1, "f": 2.5}"#).unwrap();
        let fields = form_fields(&parsed);
        assert_eq!(
            fields,
            vec![
                ("f".to_string(), "2.5".to_string()),
                ("i".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn descriptor_json_parses_into_values() {
        let parsed: PropertyBag =
            serde_json::from_str(r#"{"title": "x", "flag": true, "ids": [1, 2]}"#).unwrap();
        assert_eq!(parsed["title"], PropertyValue::from("x"));
        assert_eq!(parsed["flag"], PropertyValue::from(true));
        assert_eq!(
            parsed["ids"],
            PropertyValue::Array(vec![Scalar::Number(1.into()), Scalar::Number(2.into())])
        );
    }

    #[test]
    fn nested_objects_are_rejected() {
        assert!(serde_json::from_str::<PropertyBag>(r#"{"x": {"y": 1}}"#).is_err());
        assert!(serde_json::from_str::<PropertyBag>(r#"{"x": null}"#).is_err());
    }

    #[test]
    fn namespacing_prefixes_the_file_name() {
        let scoped = namespaced("a.txt", &bag(vec![("tags", vec!["x"].into())]));
        let fields = form_fields(&scoped);
        assert_eq!(fields[0].0, "./a.txt/tags@TypeHint");
        assert_eq!(fields[1], ("./a.txt/tags".to_string(), "x".to_string()));
    }
}
