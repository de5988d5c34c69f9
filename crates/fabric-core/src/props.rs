//! Immutable component props.
//!
//! Props are an ordered map from prop name to a dynamic [`PropValue`]. A
//! [`Props`] value never changes once built: cloning a node with new props
//! merges a [`RawProps`] delta over the source and allocates a new value,
//! while unchanged nodes keep sharing the same `Arc<Props>`.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

pub type SharedProps = Arc<Props>;

/// Props that decide whether a node needs a native view of its own.
const VIEW_FORMING_PROPS: &[&str] = &[
    "backgroundColor",
    "borderColor",
    "borderRadius",
    "borderWidth",
    "elevation",
    "nativeID",
    "opacity",
    "overflow",
    "pointerEvents",
    "shadowColor",
    "testID",
    "transform",
    "zIndex",
];

#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Arc<str>),
    Array(Vec<PropValue>),
    Map(IndexMap<Arc<str>, PropValue>),
}

impl PropValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropValue::Float(value) => Some(*value),
            PropValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::String(Arc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::String(Arc::from(value))
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => f.write_str("null"),
            PropValue::Bool(value) => write!(f, "{value}"),
            PropValue::Int(value) => write!(f, "{value}"),
            PropValue::Float(value) => write!(f, "{value}"),
            PropValue::String(value) => write!(f, "{value:?}"),
            PropValue::Array(values) => {
                f.write_str("[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            PropValue::Map(entries) => {
                f.write_str("{")?;
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Unparsed prop delta coming from the JS side.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawProps {
    values: IndexMap<Arc<str>, PropValue>,
}

impl RawProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<PropValue>) {
        self.values.insert(Arc::from(name), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(key, value)| (key.as_ref(), value))
    }
}

impl<K: AsRef<str>, V: Into<PropValue>> FromIterator<(K, V)> for RawProps {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut raw = RawProps::new();
        for (name, value) in iter {
            raw.set(name.as_ref(), value);
        }
        raw
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    values: IndexMap<Arc<str>, PropValue>,
}

impl Props {
    pub fn empty() -> SharedProps {
        Arc::new(Props::default())
    }

    pub fn from_raw(raw: &RawProps) -> Self {
        Self::default().merged(raw)
    }

    /// Returns a copy of `self` with `raw` applied on top. A `Null` value
    /// resets the prop.
    pub fn merged(&self, raw: &RawProps) -> Self {
        let mut values = self.values.clone();
        for (name, value) in raw.values.iter() {
            if *value == PropValue::Null {
                values.shift_remove(name);
            } else {
                values.insert(Arc::clone(name), value.clone());
            }
        }
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(key, value)| (key.as_ref(), value))
    }

    /// Whether these props require a host view regardless of the component.
    pub fn forms_view(&self) -> bool {
        if self.get("collapsable").and_then(PropValue::as_bool) == Some(false) {
            return true;
        }
        VIEW_FORMING_PROPS
            .iter()
            .any(|name| self.values.contains_key(*name))
    }

    /// Cheap equality: identical allocations short-circuit before comparing values.
    pub fn same(a: &SharedProps, b: &SharedProps) -> bool {
        Arc::ptr_eq(a, b) || a == b
    }
}

impl fmt::Display for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (key, value)) in self.values.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        f.write_str("}")
    }
}
