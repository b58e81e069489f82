//! The raw `proxy` setting.
//!
//! The setting arrives either from the TOML configuration or from the
//! `proxy` field of a `package.json`. Both are dynamically typed, so the
//! type check happens here rather than in serde.

use crate::routing::error::RouteConfigError;

/// Where requests should be proxied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxySpec {
    /// Every path is a candidate for the one target.
    Single(String),
    /// Context prefix → target, in configuration order.
    Contexts(Vec<(String, String)>),
}

impl ProxySpec {
    /// Interpret a TOML value.
    ///
    /// An empty string disables proxying, the same as leaving it out.
    pub fn from_toml(value: &toml::Value) -> Result<Option<Self>, RouteConfigError> {
        match value {
            toml::Value::String(s) if s.is_empty() => Ok(None),
            toml::Value::String(s) => Ok(Some(ProxySpec::Single(s.clone()))),
            toml::Value::Table(table) => {
                let mut contexts = Vec::with_capacity(table.len());
                for (context, target) in table {
                    match target {
                        toml::Value::String(t) => contexts.push((context.clone(), t.clone())),
                        other => {
                            return Err(RouteConfigError::InvalidTargetType {
                                context: context.clone(),
                                found: other.type_str(),
                            })
                        }
                    }
                }
                Ok(Some(ProxySpec::Contexts(contexts)))
            }
            other => Err(RouteConfigError::InvalidType {
                found: other.type_str(),
            }),
        }
    }

    /// Interpret a JSON value, as found in `package.json`.
    ///
    /// `null`, `false` and `""` disable proxying.
    pub fn from_json(value: &serde_json::Value) -> Result<Option<Self>, RouteConfigError> {
        use serde_json::Value;

        match value {
            Value::Null | Value::Bool(false) => Ok(None),
            Value::String(s) if s.is_empty() => Ok(None),
            Value::String(s) => Ok(Some(ProxySpec::Single(s.clone()))),
            Value::Object(map) => {
                let mut contexts = Vec::with_capacity(map.len());
                for (context, target) in map {
                    match target {
                        Value::String(t) => contexts.push((context.clone(), t.clone())),
                        other => {
                            return Err(RouteConfigError::InvalidTargetType {
                                context: context.clone(),
                                found: json_type_name(other),
                            })
                        }
                    }
                }
                Ok(Some(ProxySpec::Contexts(contexts)))
            }
            other => Err(RouteConfigError::InvalidType {
                found: json_type_name(other),
            }),
        }
    }

    /// Context → target pairs. A single target is served under `/`.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        match self {
            ProxySpec::Single(target) => vec![("/", target.as_str())],
            ProxySpec::Contexts(contexts) => contexts
                .iter()
                .map(|(c, t)| (c.as_str(), t.as_str()))
                .collect(),
        }
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;

    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toml_proxy(src: &str) -> toml::Value {
        let table: toml::Table = toml::from_str(src).unwrap();
        table["proxy"].clone()
    }

    #[test]
    fn test_string_is_single_target() {
        let spec = ProxySpec::from_toml(&toml_proxy(r#"proxy = "http://localhost:4000""#))
            .unwrap()
            .unwrap();
        assert_eq!(spec, ProxySpec::Single("http://localhost:4000".into()));
        assert_eq!(spec.entries(), vec![("/", "http://localhost:4000")]);
    }

    #[test]
    fn test_table_keeps_file_order() {
        let value = toml_proxy(
            r#"
            [proxy]
            "/b" = "http://b.local"
            "/a" = "http://a.local"
            "#,
        );
        let spec = ProxySpec::from_toml(&value).unwrap().unwrap();
        assert_eq!(
            spec.entries(),
            vec![("/b", "http://b.local"), ("/a", "http://a.local")]
        );
    }

    #[test]
    fn test_integer_is_rejected() {
        let err = ProxySpec::from_toml(&toml_proxy("proxy = 42")).unwrap_err();
        assert!(matches!(err, RouteConfigError::InvalidType { found: "integer" }));
        assert!(err.to_string().contains("must be a string or a table"));
    }

    #[test]
    fn test_non_string_target_is_rejected() {
        let value = toml_proxy(
            r#"
            [proxy]
            "/api" = 8080
            "#,
        );
        let err = ProxySpec::from_toml(&value).unwrap_err();
        match err {
            RouteConfigError::InvalidTargetType { context, found } => {
                assert_eq!(context, "/api");
                assert_eq!(found, "integer");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_string_disables_proxy() {
        assert_eq!(ProxySpec::from_toml(&toml_proxy(r#"proxy = """#)).unwrap(), None);
        assert_eq!(ProxySpec::from_json(&serde_json::json!("")).unwrap(), None);
    }

    #[test]
    fn test_json_forms() {
        assert_eq!(ProxySpec::from_json(&serde_json::Value::Null).unwrap(), None);

        let spec = ProxySpec::from_json(&serde_json::json!({
            "/socket": "http://localhost:5000",
            "/api": "http://localhost:4000"
        }))
        .unwrap()
        .unwrap();
        assert_eq!(
            spec.entries(),
            vec![
                ("/socket", "http://localhost:5000"),
                ("/api", "http://localhost:4000")
            ]
        );

        let err = ProxySpec::from_json(&serde_json::json!(42)).unwrap_err();
        assert!(matches!(err, RouteConfigError::InvalidType { found: "number" }));

        let err = ProxySpec::from_json(&serde_json::json!(["http://x"])).unwrap_err();
        assert!(matches!(err, RouteConfigError::InvalidType { found: "array" }));
    }
}
