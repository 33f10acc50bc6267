//! Properties: named, typed value cells with change notification.
//!
//! A property belongs to at most one processor. Its kind is fixed at
//! construction; writes of another kind are rejected. Bounded numeric
//! properties clamp incoming values, option properties reject unknown keys.

use crate::core::error::{ProcessorId, PropertyError};
use crate::core::types::{SelectionEntry, Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Handle returned by [`Property::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&PropertyChange)>;

/// Record of one effective property change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyChange {
    /// Owning processor, `None` for standalone properties
    pub owner: Option<ProcessorId>,
    /// Property identifier
    pub property: String,
    pub old: Value,
    pub new: Value,
}

/// One selectable entry of an option property.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionItem {
    pub key: String,
    pub label: String,
}

impl OptionItem {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// A typed, observable value cell.
pub struct Property {
    id: String,
    gui_name: String,
    kind: ValueKind,
    value: Value,
    default: Value,
    bounds: Option<(Value, Value)>,
    options: Vec<OptionItem>,
    owner: Option<ProcessorId>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: u64,
}

impl Property {
    /// Create an unbounded property holding `value`.
    pub fn new(id: impl Into<String>, gui_name: impl Into<String>, value: Value) -> Self {
        Self {
            id: id.into(),
            gui_name: gui_name.into(),
            kind: value.kind(),
            default: value.clone(),
            value,
            bounds: None,
            options: Vec::new(),
            owner: None,
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    pub fn bool(id: impl Into<String>, gui_name: impl Into<String>, value: bool) -> Self {
        Self::new(id, gui_name, Value::Bool(value))
    }

    pub fn int(id: impl Into<String>, gui_name: impl Into<String>, value: i64, min: i64, max: i64) -> Self {
        Self::new(id, gui_name, Value::Int(value)).with_bounds(Value::Int(min), Value::Int(max))
    }

    pub fn float(id: impl Into<String>, gui_name: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        Self::new(id, gui_name, Value::Float(value))
            .with_bounds(Value::Float(min), Value::Float(max))
    }

    pub fn string(id: impl Into<String>, gui_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(id, gui_name, Value::String(value.into()))
    }

    pub fn file(id: impl Into<String>, gui_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(id, gui_name, Value::FilePath(path.into()))
    }

    pub fn selection(id: impl Into<String>, gui_name: impl Into<String>, entries: Vec<SelectionEntry>) -> Self {
        Self::new(id, gui_name, Value::Selection(entries))
    }

    /// Create an option property. `selected` falls back to the first item
    /// when it is not one of `items`.
    pub fn option(
        id: impl Into<String>,
        gui_name: impl Into<String>,
        items: &[(&str, &str)],
        selected: &str,
    ) -> Self {
        let options: Vec<OptionItem> = items
            .iter()
            .map(|(key, label)| OptionItem::new(*key, *label))
            .collect();
        let key = if options.iter().any(|o| o.key == selected) {
            selected.to_string()
        } else {
            options.first().map(|o| o.key.clone()).unwrap_or_default()
        };
        let mut property = Self::new(id, gui_name, Value::Option(key));
        property.options = options;
        property
    }

    /// Declare [min, max] bounds. Ignored for kinds without bounds or when
    /// the bound kinds differ from the property kind. The current and
    /// default values are clamped into the new range.
    pub fn with_bounds(mut self, min: Value, max: Value) -> Self {
        if !self.kind.supports_bounds() || min.kind() != self.kind || max.kind() != self.kind {
            return self;
        }
        self.bounds = Some(order_bounds(min, max));
        self.value = self.clamp(self.value.clone());
        self.default = self.clamp(self.default.clone());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn gui_name(&self) -> &str {
        &self.gui_name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Current value. No side effects.
    pub fn get(&self) -> &Value {
        &self.value
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn bounds(&self) -> Option<(&Value, &Value)> {
        self.bounds.as_ref().map(|(lo, hi)| (lo, hi))
    }

    pub fn options(&self) -> &[OptionItem] {
        &self.options
    }

    pub fn has_option(&self, key: &str) -> bool {
        self.options.iter().any(|o| o.key == key)
    }

    pub fn owner(&self) -> Option<ProcessorId> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: ProcessorId) {
        self.owner = Some(owner);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Check `value` against this property and return what would be stored.
    pub fn validate(&self, value: Value) -> Result<Value, PropertyError> {
        if value.kind() != self.kind {
            return Err(PropertyError::TypeMismatch {
                property: self.id.clone(),
                expected: self.kind,
                got: value.kind(),
            });
        }
        if let Value::Option(key) = &value {
            if !self.has_option(key) {
                return Err(PropertyError::InvalidOption {
                    property: self.id.clone(),
                    option: key.clone(),
                });
            }
        }
        Ok(self.clamp(value))
    }

    /// Store `value` and notify observers if it differs from the current
    /// value. Returns whether the value changed.
    pub fn set(&mut self, value: Value) -> Result<bool, PropertyError> {
        match self.assign(value)? {
            Some(change) => {
                self.notify(&change);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Store without notifying. The network uses this to run link
    /// propagation before observers.
    pub(crate) fn assign(&mut self, value: Value) -> Result<Option<PropertyChange>, PropertyError> {
        let value = self.validate(value)?;
        if value == self.value {
            return Ok(None);
        }
        let old = std::mem::replace(&mut self.value, value);
        Ok(Some(PropertyChange {
            owner: self.owner,
            property: self.id.clone(),
            old,
            new: self.value.clone(),
        }))
    }

    /// Restore the default value.
    pub fn reset(&mut self) -> Result<bool, PropertyError> {
        self.set(self.default.clone())
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Register an observer called after every effective change.
    pub fn subscribe(&mut self, observer: impl FnMut(&PropertyChange) + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    /// Invoke observers in subscription order.
    pub fn notify(&mut self, change: &PropertyChange) {
        for (_, observer) in self.observers.iter_mut() {
            observer(change);
        }
    }

    fn clamp(&self, value: Value) -> Value {
        let Some((lo, hi)) = &self.bounds else {
            return value;
        };
        match (&value, lo, hi) {
            (Value::Int(v), Value::Int(lo), Value::Int(hi)) => Value::Int((*v).max(*lo).min(*hi)),
            (Value::Float(v), Value::Float(lo), Value::Float(hi)) => {
                Value::Float(v.max(*lo).min(*hi))
            }
            _ => match (value.components(), lo.components(), hi.components()) {
                (Some(v), Some(lo), Some(hi)) => {
                    let clamped: Vec<f64> = v
                        .iter()
                        .zip(lo.iter().zip(hi.iter()))
                        .map(|(c, (l, h))| c.max(*l).min(*h))
                        .collect();
                    Value::from_components(self.kind, &clamped, &v).unwrap_or(value)
                }
                _ => value,
            },
        }
    }
}

/// Swap bounds given in the wrong order, per component for vectors.
fn order_bounds(min: Value, max: Value) -> (Value, Value) {
    match (&min, &max) {
        (Value::Int(a), Value::Int(b)) => (Value::Int(*a.min(b)), Value::Int(*a.max(b))),
        (Value::Float(a), Value::Float(b)) => (Value::Float(a.min(*b)), Value::Float(a.max(*b))),
        _ => match (min.components(), max.components()) {
            (Some(a), Some(b)) => {
                let lo: Vec<f64> = a.iter().zip(&b).map(|(x, y)| x.min(*y)).collect();
                let hi: Vec<f64> = a.iter().zip(&b).map(|(x, y)| x.max(*y)).collect();
                let kind = min.kind();
                match (
                    Value::from_components(kind, &lo, &[]),
                    Value::from_components(kind, &hi, &[]),
                ) {
                    (Some(lo), Some(hi)) => (lo, hi),
                    _ => (min, max),
                }
            }
            _ => (min, max),
        },
    }
}

impl Clone for Property {
    /// Clones the value state. Observers are not carried over.
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            gui_name: self.gui_name.clone(),
            kind: self.kind,
            value: self.value.clone(),
            default: self.default.clone(),
            bounds: self.bounds.clone(),
            options: self.options.clone(),
            owner: self.owner,
            observers: Vec::new(),
            next_observer: 0,
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("value", &self.value)
            .field("bounds", &self.bounds)
            .field("owner", &self.owner)
            .field("observers", &self.observers.len())
            .finish()
    }
}
