use serde_json::Value;
use thiserror::Error;

/// Flat key/value payload as submitted by an HTML-like form.
///
/// Keys may repeat; pairs keep their submission order. Every value is a
/// string, numbers and flags are parsed by the consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFieldValues {
    entries: Vec<(String, String)>,
}

/// Errors raised while building raw field values from loosely typed input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RawFieldsError {
    #[error("raw field payload must be a JSON object")]
    NotAnObject,
    #[error("raw field '{0}' must be a string")]
    NotAString(String),
    #[error("raw field argument '{0}' must look like key=value")]
    MissingSeparator(String),
}

impl RawFieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair, keeping earlier values for the same key.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Builder-style variant of [`RawFieldValues::push`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Returns the last value submitted under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == key)
    }

    /// Pairs whose key starts with `prefix`, in submission order.
    pub fn entries_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.iter().filter(move |(key, _)| key.starts_with(prefix))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses `key=value` arguments; the value may itself contain `=`.
    pub fn from_assignments<I, S>(assignments: I) -> Result<Self, RawFieldsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut raw = Self::new();
        for assignment in assignments {
            let assignment = assignment.as_ref();
            let (key, value) = assignment
                .split_once('=')
                .ok_or_else(|| RawFieldsError::MissingSeparator(assignment.to_string()))?;
            raw.push(key, value);
        }
        Ok(raw)
    }

    /// Accepts a JSON object whose values are strings; `null` entries are
    /// treated as absent fields.
    pub fn from_json(value: &Value) -> Result<Self, RawFieldsError> {
        let object = value.as_object().ok_or(RawFieldsError::NotAnObject)?;
        let mut raw = Self::new();
        for (key, value) in object {
            match value {
                Value::String(text) => raw.push(key.clone(), text.clone()),
                Value::Null => {}
                _ => return Err(RawFieldsError::NotAString(key.clone())),
            }
        }
        Ok(raw)
    }
}

impl<K, V> FromIterator<(K, V)> for RawFieldValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn last_value_wins_for_repeated_keys() {
        let raw = RawFieldValues::new().with("title", "first").with("title", "second");
        assert_eq!(raw.get("title"), Some("second"));
        assert_eq!(raw.len(), 2);
    }

    #[test]
    fn assignments_split_on_first_equals() {
        let raw = RawFieldValues::from_assignments(["title=a=b", "isRequired=on"]).unwrap();
        assert_eq!(raw.get("title"), Some("a=b"));
        assert_eq!(raw.get("isRequired"), Some("on"));

        let err = RawFieldValues::from_assignments(["broken"]).unwrap_err();
        assert_eq!(err, RawFieldsError::MissingSeparator("broken".into()));
    }

    #[test]
    fn json_objects_must_hold_strings() {
        let raw = RawFieldValues::from_json(&json!({ "text-0": "hi", "number-1": null })).unwrap();
        assert_eq!(raw.get("text-0"), Some("hi"));
        assert!(!raw.contains("number-1"));

        let err = RawFieldValues::from_json(&json!({ "number-1": 4 })).unwrap_err();
        assert_eq!(err, RawFieldsError::NotAString("number-1".into()));
        assert_eq!(
            RawFieldValues::from_json(&json!(["x"])).unwrap_err(),
            RawFieldsError::NotAnObject
        );
    }
}
