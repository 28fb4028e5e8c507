use serde::{Deserialize, Deserializer};

/// Deserializes an optional integer that may arrive as a string.
///
/// Query strings carry every value as text, and flattened structs lose the
/// type hint, so both `"12"` and `12` are accepted. Empty strings become `None`.
pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(i64),
        String(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Deserializes an optional boolean that may arrive as `"true"`, `"1"`, etc.
pub fn deserialize_optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match Option::<BoolOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BoolOrString::Bool(b)) => Ok(Some(b)),
        Some(BoolOrString::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!("invalid boolean: {other}"))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Query {
        #[serde(default, deserialize_with = "deserialize_optional_i64")]
        id: Option<i64>,
        #[serde(default, deserialize_with = "deserialize_optional_bool")]
        flag: Option<bool>,
    }

    #[test]
    fn test_accepts_numbers_and_strings() {
        let q: Query = serde_json::from_str(r#"{"id": 7, "flag": true}"#).unwrap();
        assert_eq!(q.id, Some(7));
        assert_eq!(q.flag, Some(true));

        let q: Query = serde_json::from_str(r#"{"id": " 42 ", "flag": "0"}"#).unwrap();
        assert_eq!(q.id, Some(42));
        assert_eq!(q.flag, Some(false));
    }

    #[test]
    fn test_empty_and_missing_are_none() {
        let q: Query = serde_json::from_str(r#"{"id": ""}"#).unwrap();
        assert_eq!(q.id, None);
        assert_eq!(q.flag, None);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(serde_json::from_str::<Query>(r#"{"id": "abc"}"#).is_err());
        assert!(serde_json::from_str::<Query>(r#"{"flag": "maybe"}"#).is_err());
    }
}
