//! Value types held by properties.
//!
//! Property values form a closed set, so they are modelled as an enum:
//! - Exhaustive matching catches unhandled kinds in evaluators
//! - serde handles the tagged representation used by network documents
//! - The kind of a value is a cheap tag comparison

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A property value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Value {
    /// Boolean flag
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Integer vectors
    IntVec2([i64; 2]),
    IntVec3([i64; 3]),
    IntVec4([i64; 4]),
    /// Float vectors
    FloatVec2([f64; 2]),
    FloatVec3([f64; 3]),
    FloatVec4([f64; 4]),
    /// Key of the selected entry of an option (enum) property
    Option(String),
    /// Path on the local file system
    FilePath(PathBuf),
    /// Plot selection entries
    Selection(Vec<SelectionEntry>),
}

/// Kind tag of a [`Value`]. A property's kind never changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    String,
    IntVec2,
    IntVec3,
    IntVec4,
    FloatVec2,
    FloatVec3,
    FloatVec4,
    Option,
    FilePath,
    Selection,
}

/// Closed interval on one plot axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// One entry of a plot selection.
///
/// `ranges` is the selected region (one interval per axis); the flags
/// describe how the plot treats the region.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SelectionEntry {
    pub ranges: Vec<Interval>,
    #[serde(default)]
    pub highlight: bool,
    #[serde(default)]
    pub label: bool,
    #[serde(default)]
    pub zoom_to: bool,
}

impl SelectionEntry {
    /// Entry selecting `ranges` with all flags cleared.
    pub fn new(ranges: Vec<Interval>) -> Self {
        Self {
            ranges,
            ..Self::default()
        }
    }
}

// ============================================================================
// Value Implementation
// ============================================================================

impl Value {
    /// Get the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::IntVec2(_) => ValueKind::IntVec2,
            Value::IntVec3(_) => ValueKind::IntVec3,
            Value::IntVec4(_) => ValueKind::IntVec4,
            Value::FloatVec2(_) => ValueKind::FloatVec2,
            Value::FloatVec3(_) => ValueKind::FloatVec3,
            Value::FloatVec4(_) => ValueKind::FloatVec4,
            Value::Option(_) => ValueKind::Option,
            Value::FilePath(_) => ValueKind::FilePath,
            Value::Selection(_) => ValueKind::Selection,
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Bool(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    /// Try to get this value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        if let Value::Int(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    /// Try to get this value as a float.
    /// Integers are converted to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string slice. Option keys count as strings.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Option(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a path.
    pub fn as_path(&self) -> Option<&PathBuf> {
        if let Value::FilePath(p) = self {
            Some(p)
        } else {
            None
        }
    }

    /// Try to get this value as plot selection entries.
    pub fn as_selection(&self) -> Option<&[SelectionEntry]> {
        if let Value::Selection(entries) = self {
            Some(entries)
        } else {
            None
        }
    }

    /// Components of a vector value as floats.
    pub fn components(&self) -> Option<Vec<f64>> {
        match self {
            Value::IntVec2(v) => Some(v.iter().map(|c| *c as f64).collect()),
            Value::IntVec3(v) => Some(v.iter().map(|c| *c as f64).collect()),
            Value::IntVec4(v) => Some(v.iter().map(|c| *c as f64).collect()),
            Value::FloatVec2(v) => Some(v.to_vec()),
            Value::FloatVec3(v) => Some(v.to_vec()),
            Value::FloatVec4(v) => Some(v.to_vec()),
            _ => None,
        }
    }

    /// Build a vector value of the given kind from float components.
    ///
    /// Missing components are taken from `fill`, integer kinds are rounded.
    pub fn from_components(kind: ValueKind, components: &[f64], fill: &[f64]) -> Option<Value> {
        let dim = kind.dimension()?;
        let pick = |i: usize| {
            components
                .get(i)
                .or_else(|| fill.get(i))
                .copied()
                .unwrap_or(0.0)
        };
        let ints = |n: usize| (0..n).map(|i| pick(i).round() as i64).collect::<Vec<_>>();
        let floats = |n: usize| (0..n).map(pick).collect::<Vec<_>>();
        let value = match kind {
            ValueKind::IntVec2 => {
                let v = ints(dim);
                Value::IntVec2([v[0], v[1]])
            }
            ValueKind::IntVec3 => {
                let v = ints(dim);
                Value::IntVec3([v[0], v[1], v[2]])
            }
            ValueKind::IntVec4 => {
                let v = ints(dim);
                Value::IntVec4([v[0], v[1], v[2], v[3]])
            }
            ValueKind::FloatVec2 => {
                let v = floats(dim);
                Value::FloatVec2([v[0], v[1]])
            }
            ValueKind::FloatVec3 => {
                let v = floats(dim);
                Value::FloatVec3([v[0], v[1], v[2]])
            }
            ValueKind::FloatVec4 => {
                let v = floats(dim);
                Value::FloatVec4([v[0], v[1], v[2], v[3]])
            }
            _ => return None,
        };
        Some(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::Option(s) => write!(f, "{}", s),
            Value::FilePath(p) => write!(f, "{}", p.display()),
            Value::Selection(entries) => write!(f, "Selection[{}]", entries.len()),
            vector => {
                let parts: Vec<String> = vector
                    .components()
                    .unwrap_or_default()
                    .iter()
                    .map(|c| c.to_string())
                    .collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}

// ============================================================================
// ValueKind Implementation
// ============================================================================

impl ValueKind {
    /// Whether this is an int or float scalar.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::Float)
    }

    /// Members of the scalar conversion group.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            ValueKind::Bool | ValueKind::Int | ValueKind::Float | ValueKind::String
        )
    }

    /// Whether this is an int or float vector.
    pub fn is_vector(&self) -> bool {
        self.dimension().is_some()
    }

    /// Whether this is an integer vector.
    pub fn is_int_vector(&self) -> bool {
        matches!(
            self,
            ValueKind::IntVec2 | ValueKind::IntVec3 | ValueKind::IntVec4
        )
    }

    /// Number of components of a vector kind.
    pub fn dimension(&self) -> Option<usize> {
        match self {
            ValueKind::IntVec2 | ValueKind::FloatVec2 => Some(2),
            ValueKind::IntVec3 | ValueKind::FloatVec3 => Some(3),
            ValueKind::IntVec4 | ValueKind::FloatVec4 => Some(4),
            _ => None,
        }
    }

    /// Whether properties of this kind may declare [min, max] bounds.
    pub fn supports_bounds(&self) -> bool {
        self.is_numeric() || self.is_vector()
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::IntVec2 => "ivec2",
            ValueKind::IntVec3 => "ivec3",
            ValueKind::IntVec4 => "ivec4",
            ValueKind::FloatVec2 => "vec2",
            ValueKind::FloatVec3 => "vec3",
            ValueKind::FloatVec4 => "vec4",
            ValueKind::Option => "option",
            ValueKind::FilePath => "file path",
            ValueKind::Selection => "plot selection",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kind() {
        assert_eq!(Value::Float(1.0).kind(), ValueKind::Float);
        assert_eq!(Value::IntVec3([1, 2, 3]).kind(), ValueKind::IntVec3);
        assert_eq!(Value::Option("linear".into()).kind(), ValueKind::Option);
    }

    #[test]
    fn test_components_and_fill() {
        let v = Value::IntVec3([1, 2, 3]);
        assert_eq!(v.components(), Some(vec![1.0, 2.0, 3.0]));

        let widened = Value::from_components(ValueKind::FloatVec4, &[1.0, 2.0], &[9.0, 9.0, 7.0, 8.0]);
        assert_eq!(widened, Some(Value::FloatVec4([1.0, 2.0, 7.0, 8.0])));

        let rounded = Value::from_components(ValueKind::IntVec2, &[1.4, 2.6], &[]);
        assert_eq!(rounded, Some(Value::IntVec2([1, 3])));

        assert!(Value::from_components(ValueKind::Float, &[1.0], &[]).is_none());
    }

    #[test]
    fn test_value_serde_shape() {
        let json = serde_json::to_string(&Value::Float(0.5)).unwrap();
        assert_eq!(json, r#"{"type":"float","data":0.5}"#);

        let back: Value = serde_json::from_str(r#"{"type":"int_vec2","data":[3,4]}"#).unwrap();
        assert_eq!(back, Value::IntVec2([3, 4]));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::FloatVec2([1.0, 0.5]).to_string(), "(1, 0.5)");
        assert_eq!(ValueKind::IntVec4.to_string(), "ivec4");
    }
}
