//! The read-only instance abstraction.

use std::collections::HashMap;

/// A raw observation value, as supplied by the data source.
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceValue {
    /// A numeric value.
    Num(f64),
    /// A nominal label, resolved to a level index through the attribute.
    Nominal(String),
}

impl From<f64> for InstanceValue {
    fn from(v: f64) -> Self {
        Self::Num(v)
    }
}

macro_rules! impl_num_from {
    ($($t:ty),*) => {
        $(impl From<$t> for InstanceValue {
            fn from(v: $t) -> Self {
                Self::Num(v as f64)
            }
        })*
    };
}

impl_num_from!(f32, i64, i32, u64, u32);

impl From<&str> for InstanceValue {
    fn from(v: &str) -> Self {
        Self::Nominal(v.to_owned())
    }
}

impl From<String> for InstanceValue {
    fn from(v: String) -> Self {
        Self::Nominal(v)
    }
}

/// A labelled or unlabelled observation.
///
/// The tree only reads values by attribute name, plus the observation weight.
pub trait Instance {
    /// The raw value recorded for an attribute, if any.
    fn get_value(&self, attribute: &str) -> Option<InstanceValue>;

    /// The observation weight.
    fn get_weight(&self) -> f64 {
        1.0
    }
}

impl<T: Instance + ?Sized> Instance for &T {
    fn get_value(&self, attribute: &str) -> Option<InstanceValue> {
        (**self).get_value(attribute)
    }

    fn get_weight(&self) -> f64 {
        (**self).get_weight()
    }
}

/// An instance backed by an attribute name → value map.
#[derive(Debug, Clone)]
pub struct MapInstance {
    values: HashMap<String, InstanceValue>,
    weight: f64,
}

impl MapInstance {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            weight: 1.0,
        }
    }

    /// Set an attribute value, consuming and returning the instance.
    pub fn set(mut self, attribute: impl Into<String>, value: impl Into<InstanceValue>) -> Self {
        self.values.insert(attribute.into(), value.into());
        self
    }

    /// Override the observation weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

impl Default for MapInstance {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V: Into<InstanceValue>> FromIterator<(K, V)> for MapInstance {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            weight: 1.0,
        }
    }
}

impl<K: Into<String>, V: Into<InstanceValue>, const N: usize> From<[(K, V); N]> for MapInstance {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl Instance for MapInstance {
    fn get_value(&self, attribute: &str) -> Option<InstanceValue> {
        self.values.get(attribute).cloned()
    }

    fn get_weight(&self) -> f64 {
        self.weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_instance_reads_back_values() {
        let inst = MapInstance::from([("outlook", InstanceValue::from("sunny"))])
            .set("temperature", 85)
            .with_weight(2.0);

        assert_eq!(
            inst.get_value("outlook"),
            Some(InstanceValue::Nominal("sunny".to_owned()))
        );
        assert_eq!(inst.get_value("temperature"), Some(InstanceValue::Num(85.0)));
        assert_eq!(inst.get_value("humidity"), None);
        assert_eq!(inst.get_weight(), 2.0);
    }

    #[test]
    fn default_weight_is_one() {
        assert_eq!(MapInstance::new().get_weight(), 1.0);
    }
}
