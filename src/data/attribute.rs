//! Attribute descriptors and the values extracted from instances.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::instance::{Instance, InstanceValue};

/// The kind of a model attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// A floating-point number.
    Numeric,
    /// One of a (possibly growing) set of named levels.
    Nominal,
}

/// An attribute value extracted from an instance.
///
/// Numeric attributes carry the number itself; nominal attributes carry the
/// level index. Missing values are represented as NaN, so a missing value
/// propagates through arithmetic without extra branching.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeValue(f64);

impl AttributeValue {
    /// The missing value.
    pub fn missing() -> Self {
        Self(f64::NAN)
    }

    /// Whether this value is missing.
    pub fn is_missing(&self) -> bool {
        self.0.is_nan()
    }

    /// The raw numeric value. NaN when missing.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// The nominal level index. `None` when missing or not an index.
    pub fn index(&self) -> Option<usize> {
        if self.0.is_nan() || self.0 < 0.0 {
            None
        } else {
            Some(self.0 as usize)
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self(v)
    }
}

impl From<usize> for AttributeValue {
    fn from(index: usize) -> Self {
        Self(index as f64)
    }
}

/// A model attribute: a name plus the kind that decides how raw instance
/// values are interpreted.
#[derive(Debug)]
pub struct Attribute {
    name: String,
    kind: AttributeKind,
    values: AttributeValues,
}

impl Attribute {
    /// Create a numeric attribute.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Numeric,
            values: AttributeValues::new(),
        }
    }

    /// Create a nominal attribute with an initially empty level set.
    pub fn nominal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Nominal,
            values: AttributeValues::new(),
        }
    }

    /// Create a nominal attribute with a predefined level set.
    pub fn nominal_with_levels(name: impl Into<String>, levels: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Nominal,
            values: AttributeValues::with_levels(levels),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    pub fn is_nominal(&self) -> bool {
        self.kind == AttributeKind::Nominal
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == AttributeKind::Numeric
    }

    /// The nominal level set. Empty for numeric attributes.
    pub fn values(&self) -> &AttributeValues {
        &self.values
    }

    /// Number of known nominal levels; 0 for numeric attributes.
    pub fn len(&self) -> usize {
        match self.kind {
            AttributeKind::Numeric => 0,
            AttributeKind::Nominal => self.values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Interpret a raw instance value for this attribute.
    ///
    /// Numeric attributes accept numbers; nominal attributes intern the label,
    /// assigning a fresh level index on first sight. Anything else is missing.
    pub fn value_of(&self, raw: &InstanceValue) -> AttributeValue {
        match (self.kind, raw) {
            (AttributeKind::Numeric, InstanceValue::Num(n)) => AttributeValue::from(*n),
            (AttributeKind::Nominal, InstanceValue::Nominal(s)) => {
                AttributeValue::from(self.values.index_of(s))
            }
            _ => AttributeValue::missing(),
        }
    }

    /// Extract this attribute's value from an instance.
    pub fn value_in(&self, instance: &dyn Instance) -> AttributeValue {
        match instance.get_value(&self.name) {
            Some(raw) => self.value_of(&raw),
            None => AttributeValue::missing(),
        }
    }
}

#[derive(Debug, Default)]
struct ValuesInner {
    index: HashMap<String, usize>,
    // Lazily regenerated from `index`; cleared whenever a level is added.
    labels: Vec<String>,
}

/// A growing set of nominal levels, safe to query from any thread.
///
/// Lookups that encounter an unseen label append it and return the fresh
/// index. Only the label → index map is authoritative; the reverse vector is
/// a cache rebuilt on demand.
#[derive(Debug, Default)]
pub struct AttributeValues {
    inner: RwLock<ValuesInner>,
}

impl AttributeValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_levels(levels: &[&str]) -> Self {
        let mut index = HashMap::with_capacity(levels.len());
        for (i, level) in levels.iter().enumerate() {
            index.insert((*level).to_owned(), i);
        }
        Self {
            inner: RwLock::new(ValuesInner {
                index,
                labels: Vec::new(),
            }),
        }
    }

    /// Number of known levels.
    pub fn len(&self) -> usize {
        self.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The index of a label, assigning a fresh one if it has not been seen.
    pub fn index_of(&self, label: &str) -> usize {
        if let Some(&i) = self.read().index.get(label) {
            return i;
        }

        let mut inner = self.write();
        if let Some(&i) = inner.index.get(label) {
            return i;
        }
        let i = inner.index.len();
        inner.index.insert(label.to_owned(), i);
        inner.labels.clear();
        i
    }

    /// The index of a label, without assigning one.
    pub fn get(&self, label: &str) -> Option<usize> {
        self.read().index.get(label).copied()
    }

    /// The label at a level index.
    pub fn label(&self, index: usize) -> Option<String> {
        self.labels().get(index).cloned()
    }

    /// All labels in index order.
    pub fn labels(&self) -> Vec<String> {
        {
            let inner = self.read();
            if inner.labels.len() == inner.index.len() {
                return inner.labels.clone();
            }
        }

        let mut inner = self.write();
        if inner.labels.len() != inner.index.len() {
            let mut labels = vec![String::new(); inner.index.len()];
            for (label, &i) in &inner.index {
                labels[i] = label.clone();
            }
            inner.labels = labels;
        }
        inner.labels.clone()
    }

    /// The label → index entries, ordered by index.
    pub fn entries(&self) -> Vec<(String, usize)> {
        let mut entries: Vec<(String, usize)> = self
            .read()
            .index
            .iter()
            .map(|(label, &i)| (label.clone(), i))
            .collect();
        entries.sort_by_key(|(_, i)| *i);
        entries
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ValuesInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ValuesInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
