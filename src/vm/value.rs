//! Runtime values.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::heap::Tracked;

/// A runtime value. Strings and objects live on the heap and are shared by
/// reference count; everything else is copied.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    String(Rc<StringObject>),
    Boolean(bool),
    Undefined,
    Null,
    Object(Rc<RefCell<Object>>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Object(_) => "object",
        }
    }

    pub fn is_heap(&self) -> bool {
        matches!(self, Value::String(_) | Value::Object(_))
    }

    /// Text used when this value is one side of a string concatenation.
    /// Numbers always carry two decimals.
    pub fn concat_form(&self) -> String {
        match self {
            Value::Number(n) if n.is_finite() => format!("{:.2}", n),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => fmt_number(*n, f),
            Value::String(s) => f.write_str(s.as_str()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Object(_) => f.write_str("[object Object]"),
        }
    }
}

fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        write!(f, "{}", n)
    }
}

impl PartialEq for Value {
    /// Strings compare by content, objects by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a.as_str() == b.as_str(),
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Immutable string content.
pub struct StringObject {
    content: String,
    _tracked: Tracked,
}

impl StringObject {
    pub(super) fn new(content: String, tracked: Tracked) -> Self {
        Self {
            content,
            _tracked: tracked,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl fmt::Debug for StringObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.content)
    }
}

/// A plain object: properties in insertion order, names unique.
pub struct Object {
    properties: IndexMap<String, Value>,
    _tracked: Tracked,
}

impl Object {
    pub(super) fn new(tracked: Tracked) -> Self {
        Self {
            properties: IndexMap::new(),
            _tracked: tracked,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Set a property, replacing any previous value under the same name.
    /// Returns false if the name is new and the object already holds
    /// `limit` properties.
    pub fn set(&mut self, name: &str, value: Value, limit: usize) -> bool {
        if let Some(slot) = self.properties.get_mut(name) {
            *slot = value;
            return true;
        }
        if self.properties.len() >= limit {
            return false;
        }
        self.properties.insert(name.to_string(), value);
        true
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }
}

// Released with a worklist so that long chains of objects do not recurse
// once per link.
impl Drop for Object {
    fn drop(&mut self) {
        let mut pending: Vec<Value> = self.properties.drain(..).map(|(_, v)| v).collect();
        while let Some(value) = pending.pop() {
            if let Value::Object(rc) = value {
                if let Ok(cell) = Rc::try_unwrap(rc) {
                    let mut object = cell.into_inner();
                    pending.extend(object.properties.drain(..).map(|(_, v)| v));
                }
            }
        }
    }
}

// Property values are left out: an object may contain itself.
impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}
