//! Performance oriented JSON manipulation.

use std::fmt;

use apollo_compiler::ast;
use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map;
pub use serde_json_bytes::Value;

/// A JSON object.
pub type Object = Map<ByteString, Value>;

/// A path element inside a [`Path`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathElement {
    /// An index path element.
    Index(usize),

    /// A key path element.
    Key(String),
}

/// A response path, from the root of the result down to a field.
///
/// Rendered as `/hello/pets/1/name`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(pub Vec<PathElement>);

impl Path {
    pub fn empty() -> Path {
        Path(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn join(&self, element: impl Into<PathElement>) -> Path {
        let mut elements = self.0.clone();
        elements.push(element.into());
        Path(elements)
    }
}

impl From<&str> for PathElement {
    fn from(key: &str) -> Self {
        PathElement::Key(key.to_string())
    }
}

impl From<usize> for PathElement {
    fn from(index: usize) -> Self {
        PathElement::Index(index)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for element in &self.0 {
            match element {
                PathElement::Index(index) => write!(f, "/{index}")?,
                PathElement::Key(key) => write!(f, "/{key}")?,
            }
        }
        Ok(())
    }
}

/// Converts a literal argument value to JSON.
///
/// Returns `None` when the literal references a variable, or contains one.
pub fn literal_to_json(value: &ast::Value) -> Option<Value> {
    Some(match value {
        ast::Value::Variable(_) => return None,
        ast::Value::Null => Value::Null,
        ast::Value::Enum(name) => name.as_str().into(),
        ast::Value::String(s) => s.as_str().into(),
        ast::Value::Boolean(b) => (*b).into(),
        ast::Value::Int(i) => {
            let number = if let Ok(i) = i.as_str().parse::<i64>() {
                serde_json::Number::from(i)
            } else if let Ok(u) = i.as_str().parse::<u64>() {
                serde_json::Number::from(u)
            } else {
                // Beyond 64 bits only a float can hold it
                serde_json::Number::from_f64(i.try_to_f64().ok()?)?
            };
            Value::Number(number)
        }
        ast::Value::Float(f) => {
            serde_json::Number::from_f64(f.try_to_f64().ok()?).map(Value::Number)?
        }
        ast::Value::List(items) => Value::Array(
            items
                .iter()
                .map(|item| literal_to_json(item))
                .collect::<Option<Vec<_>>>()?,
        ),
        ast::Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, value)| {
                    Some((ByteString::from(name.as_str()), literal_to_json(value)?))
                })
                .collect::<Option<Object>>()?,
        ),
    })
}
