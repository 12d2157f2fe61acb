use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPointer {
    raw: String,
}

impl JsonPointer {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Accepts "" (whole document), "/a/b", or the fragment form "#/a/b".
    pub fn parse(fragment: &str) -> Result<Self, JsonPointerError> {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        if fragment.is_empty() {
            return Ok(Self {
                raw: String::new(),
            });
        }
        if !fragment.starts_with('/') {
            return Err(JsonPointerError::InvalidPrefix);
        }

        // Validate escape sequences (RFC6901): "~0" and "~1" only.
        let mut chars = fragment.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch == '~' {
                match chars.next() {
                    Some('0' | '1') => {}
                    _ => return Err(JsonPointerError::InvalidEscape),
                }
            }
        }

        Ok(Self {
            raw: fragment.to_string(),
        })
    }

    /// Builds a pointer from unescaped reference tokens.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut raw = String::new();
        for t in tokens {
            raw.push('/');
            raw.push_str(&escape_token(t.as_ref()));
        }
        Self { raw }
    }

    /// Unescaped reference tokens.
    pub fn tokens(&self) -> Vec<String> {
        if self.raw.is_empty() {
            return Vec::new();
        }
        self.raw[1..].split('/').map(unescape_token).collect()
    }

    pub fn resolve<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        value.pointer(&self.raw)
    }

    /// Sets the value at this pointer, creating missing containers along the way.
    ///
    /// A missing container is an array when the token after it is `-`, otherwise an object.
    pub fn assign(&self, target: &mut Value, new_value: Value) -> Result<(), JsonPointerError> {
        let tokens = self.tokens();
        let Some((last, parents)) = tokens.split_last() else {
            *target = new_value;
            return Ok(());
        };

        let mut cur = target;
        for (i, token) in parents.iter().enumerate() {
            let next = tokens.get(i + 1).map(String::as_str);
            if cur.is_null() {
                *cur = Value::Object(serde_json::Map::new());
            }
            cur = match cur {
                Value::Object(map) => map.entry(token.clone()).or_insert_with(|| empty_container(next)),
                Value::Array(arr) => {
                    if token == "-" {
                        arr.push(empty_container(next));
                        let end = arr.len() - 1;
                        &mut arr[end]
                    } else {
                        let idx = array_index(token, arr.len())?;
                        &mut arr[idx]
                    }
                }
                _ => return Err(JsonPointerError::NotAContainer(token.clone())),
            };
        }

        if cur.is_null() {
            *cur = empty_container(Some(last.as_str()));
        }
        match cur {
            Value::Object(map) => {
                map.insert(last.clone(), new_value);
                Ok(())
            }
            Value::Array(arr) => {
                if last == "-" {
                    arr.push(new_value);
                    return Ok(());
                }
                let idx = array_index(last, arr.len())?;
                arr[idx] = new_value;
                Ok(())
            }
            _ => Err(JsonPointerError::NotAContainer(last.clone())),
        }
    }
}

fn empty_container(next_token: Option<&str>) -> Value {
    match next_token {
        Some("-") => Value::Array(Vec::new()),
        _ => Value::Object(serde_json::Map::new()),
    }
}

fn array_index(token: &str, len: usize) -> Result<usize, JsonPointerError> {
    let idx: usize = token
        .parse()
        .map_err(|_| JsonPointerError::InvalidIndex(token.to_string()))?;
    if idx >= len {
        return Err(JsonPointerError::InvalidIndex(token.to_string()));
    }
    Ok(idx)
}

pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

pub fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JsonPointerError {
    #[error("json pointer must start with '/'")]
    InvalidPrefix,
    #[error("json pointer contains invalid escape (only ~0 and ~1 are allowed)")]
    InvalidEscape,
    #[error("json pointer index out of range or malformed: {0}")]
    InvalidIndex(String),
    #[error("json pointer token '{0}' does not address an object or array")]
    NotAContainer(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tokens_are_unescaped() {
        let p = JsonPointer::parse("#/paths/~1pet~1{petId}/get").unwrap();
        assert_eq!(p.tokens(), vec!["paths", "/pet/{petId}", "get"]);
        assert_eq!(JsonPointer::from_tokens(p.tokens()), p);
    }

    #[test]
    fn assign_creates_missing_members() {
        let mut v = json!({"a": {"b": 1}, "list": [1, 2]});
        JsonPointer::parse("/a/c/d").unwrap().assign(&mut v, json!("x")).unwrap();
        JsonPointer::parse("/list/1").unwrap().assign(&mut v, json!(9)).unwrap();
        assert_eq!(v, json!({"a": {"b": 1, "c": {"d": "x"}}, "list": [1, 9]}));
    }

    #[test]
    fn assign_appends_and_creates_arrays() {
        let mut v = json!({});
        JsonPointer::parse("/tags/-").unwrap().assign(&mut v, json!("a")).unwrap();
        JsonPointer::parse("/tags/-").unwrap().assign(&mut v, json!("b")).unwrap();
        assert_eq!(v, json!({"tags": ["a", "b"]}));
    }

    #[test]
    fn assign_rejects_out_of_range_index() {
        let mut v = json!([1]);
        let err = JsonPointer::parse("/5").unwrap().assign(&mut v, json!(0)).unwrap_err();
        assert_eq!(err, JsonPointerError::InvalidIndex("5".into()));
    }
}
