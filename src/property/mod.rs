//! Typed property accessors
//!
//! Entity modules expose their properties as constants such as
//! `component::ROLES: List<UriValue>`. An accessor only knows its predicate;
//! the schema of the host decides cardinality and validation.

use std::marker::PhantomData;

use crate::aggregate::{Document, Entity};
use crate::error::{SbolError, SbolResult};
use crate::value_objects::{EntityId, PropertyValue, ValueKind};

/// Something that stores property values: a detached [`Entity`] or an
/// attached one borrowed through its document
pub trait PropertyHost {
    fn values(&self, predicate: &str) -> SbolResult<&[PropertyValue]>;

    /// Replace all values of `predicate`
    fn set_values(&mut self, predicate: &str, values: Vec<PropertyValue>) -> SbolResult<()>;

    /// Append a value to a list property
    fn add_value(&mut self, predicate: &str, value: PropertyValue) -> SbolResult<()>;

    /// Remove the first matching value from a list property
    fn remove_value(&mut self, predicate: &str, value: &PropertyValue) -> SbolResult<()>;
}

/// Maps a [`PropertyValue`] variant onto a Rust type
pub trait ValueType {
    type Value;
    const KIND: ValueKind;

    fn wrap(value: Self::Value) -> PropertyValue;
    fn unwrap(value: &PropertyValue) -> Option<Self::Value>;
}

pub struct UriValue;
pub struct TextValue;
pub struct IntegerValue;
pub struct FloatValue;
pub struct BooleanValue;

impl ValueType for UriValue {
    const KIND: ValueKind = ValueKind::Uri;
    type Value = String;

    fn wrap(value: String) -> PropertyValue {
        PropertyValue::Uri(value)
    }

    fn unwrap(value: &PropertyValue) -> Option<String> {
        value.as_uri().map(str::to_string)
    }
}

impl ValueType for TextValue {
    const KIND: ValueKind = ValueKind::Text;
    type Value = String;

    fn wrap(value: String) -> PropertyValue {
        PropertyValue::Text(value)
    }

    fn unwrap(value: &PropertyValue) -> Option<String> {
        value.as_text().map(str::to_string)
    }
}

impl ValueType for IntegerValue {
    const KIND: ValueKind = ValueKind::Integer;
    type Value = i64;

    fn wrap(value: i64) -> PropertyValue {
        PropertyValue::Integer(value)
    }

    fn unwrap(value: &PropertyValue) -> Option<i64> {
        match value {
            PropertyValue::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl ValueType for FloatValue {
    const KIND: ValueKind = ValueKind::Float;
    type Value = f64;

    fn wrap(value: f64) -> PropertyValue {
        PropertyValue::Float(value)
    }

    fn unwrap(value: &PropertyValue) -> Option<f64> {
        match value {
            PropertyValue::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl ValueType for BooleanValue {
    const KIND: ValueKind = ValueKind::Boolean;
    type Value = bool;

    fn wrap(value: bool) -> PropertyValue {
        PropertyValue::Boolean(value)
    }

    fn unwrap(value: &PropertyValue) -> Option<bool> {
        match value {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

fn unexpected<T: ValueType>(predicate: &str, value: &PropertyValue) -> SbolError {
    SbolError::TypeMismatch {
        expected: format!("{} value on <{predicate}>", T::KIND),
        found: value.kind().to_string(),
    }
}

/// Accessor for a property with at most one value
pub struct Scalar<T> {
    predicate: &'static str,
    kind: PhantomData<fn() -> T>,
}

impl<T> Scalar<T> {
    pub const fn new(predicate: &'static str) -> Self {
        Self {
            predicate,
            kind: PhantomData,
        }
    }

    pub fn predicate(&self) -> &'static str {
        self.predicate
    }
}

impl<T: ValueType> Scalar<T> {
    pub fn get<H: PropertyHost + ?Sized>(&self, host: &H) -> SbolResult<Option<T::Value>> {
        match host.values(self.predicate)?.first() {
            None => Ok(None),
            Some(value) => T::unwrap(value)
                .map(Some)
                .ok_or_else(|| unexpected::<T>(self.predicate, value)),
        }
    }

    pub fn set<H: PropertyHost + ?Sized>(&self, host: &mut H, value: impl Into<T::Value>) -> SbolResult<()> {
        host.set_values(self.predicate, vec![T::wrap(value.into())])
    }

    /// Unset the property; fails if it is required
    pub fn clear<H: PropertyHost + ?Sized>(&self, host: &mut H) -> SbolResult<()> {
        host.set_values(self.predicate, Vec::new())
    }
}

/// Accessor for an ordered, multi-valued property
pub struct List<T> {
    predicate: &'static str,
    kind: PhantomData<fn() -> T>,
}

impl<T> List<T> {
    pub const fn new(predicate: &'static str) -> Self {
        Self {
            predicate,
            kind: PhantomData,
        }
    }

    pub fn predicate(&self) -> &'static str {
        self.predicate
    }
}

impl<T: ValueType> List<T> {
    pub fn get<H: PropertyHost + ?Sized>(&self, host: &H) -> SbolResult<Vec<T::Value>> {
        host.values(self.predicate)?
            .iter()
            .map(|value| T::unwrap(value).ok_or_else(|| unexpected::<T>(self.predicate, value)))
            .collect()
    }

    /// Replace the whole list
    pub fn set<H, I, V>(&self, host: &mut H, values: I) -> SbolResult<()>
    where
        H: PropertyHost + ?Sized,
        I: IntoIterator<Item = V>,
        V: Into<T::Value>,
    {
        let values = values.into_iter().map(|v| T::wrap(v.into())).collect();
        host.set_values(self.predicate, values)
    }

    pub fn add<H: PropertyHost + ?Sized>(&self, host: &mut H, value: impl Into<T::Value>) -> SbolResult<()> {
        host.add_value(self.predicate, T::wrap(value.into()))
    }

    pub fn remove<H: PropertyHost + ?Sized>(&self, host: &mut H, value: impl Into<T::Value>) -> SbolResult<()> {
        host.remove_value(self.predicate, &T::wrap(value.into()))
    }
}

/// Accessor for a container of owned child entities
pub struct OwnedObject {
    predicate: &'static str,
}

impl OwnedObject {
    pub const fn new(predicate: &'static str) -> Self {
        Self { predicate }
    }

    pub fn predicate(&self) -> &'static str {
        self.predicate
    }

    /// Attach `child` to `parent`; returns the child's id in the document
    pub fn add(&self, doc: &mut Document, parent: EntityId, child: Entity) -> SbolResult<EntityId> {
        doc.add_child(parent, self.predicate, child)
    }

    /// Detach the child with identity `uri` along with its subtree
    pub fn remove(&self, doc: &mut Document, parent: EntityId, uri: &str) -> SbolResult<Entity> {
        doc.remove_child(parent, self.predicate, uri)
    }

    pub fn get<'d>(&self, doc: &'d Document, parent: EntityId, uri: &str) -> SbolResult<&'d Entity> {
        doc.child(parent, self.predicate, uri)
    }

    /// Children in insertion order
    pub fn all<'d>(&self, doc: &'d Document, parent: EntityId) -> SbolResult<Vec<&'d Entity>> {
        doc.children(parent, self.predicate)
    }

    pub fn len(&self, doc: &Document, parent: EntityId) -> SbolResult<usize> {
        Ok(doc.entity(parent)?.child_ids(self.predicate)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::entities::{component, identified, measurement};
    use crate::value_objects::vocabulary::*;

    #[test]
    fn test_scalar_get_set_clear() {
        let config = Config::default();
        let mut c = component::new(&config, "c1").unwrap();

        assert_eq!(identified::NAME.get(&c).unwrap(), None);
        identified::NAME.set(&mut c, "LacI promoter").unwrap();
        assert_eq!(identified::NAME.get(&c).unwrap().as_deref(), Some("LacI promoter"));

        identified::NAME.clear(&mut c).unwrap();
        assert_eq!(identified::NAME.get(&c).unwrap(), None);
    }

    #[test]
    fn test_clear_required_fails() {
        let config = Config::default();
        let mut c = component::new(&config, "c1").unwrap();

        let err = component::ACCESS.clear(&mut c).unwrap_err();
        assert!(matches!(err, SbolError::CardinalityViolation { .. }));
        assert_eq!(component::ACCESS.get(&c).unwrap().as_deref(), Some(SBOL_ACCESS_PUBLIC));
    }

    #[test]
    fn test_list_accessors() {
        let config = Config::default();
        let mut c = component::new(&config, "c1").unwrap();

        component::ROLES.set(&mut c, [SO_PROMOTER, SO_CDS]).unwrap();
        component::ROLES.add(&mut c, SO_TERMINATOR).unwrap();
        component::ROLES.remove(&mut c, SO_PROMOTER).unwrap();

        assert_eq!(
            component::ROLES.get(&c).unwrap(),
            vec![SO_CDS.to_string(), SO_TERMINATOR.to_string()]
        );
    }

    #[test]
    fn test_float_accessor() {
        let config = Config::default();
        let mut m = measurement::new(&config, "m1", 2.5, "http://www.ontology-of-units-of-measure.org/resource/om-2/molar").unwrap();

        assert_eq!(measurement::VALUE.get(&m).unwrap(), Some(2.5));
        measurement::VALUE.set(&mut m, 0.125).unwrap();
        assert_eq!(measurement::VALUE.get(&m).unwrap(), Some(0.125));
    }
}
