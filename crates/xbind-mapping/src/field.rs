//! Type-erased field access.

use crate::{Error, Result};
use std::any::{Any, type_name};

type GetFn = Box<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;
type SetFn = Box<dyn Fn(&mut dyn Any, Box<dyn Any>) -> Result<()> + Send + Sync>;

/// A get/set pair over one field of a target type, erased to `dyn Any` so a
/// descriptor can hold accessors for arbitrary types.
///
/// Built from typed closures; downcast mismatches surface as
/// [`Error::TypeMismatch`] carrying the field name.
pub struct FieldAccessor {
    name: String,
    get: GetFn,
    set: SetFn,
}

impl FieldAccessor {
    /// Accessor for a field whose value is always present.
    pub fn new<O, T, G, S>(name: impl Into<String>, get: G, set: S) -> Self
    where
        O: 'static,
        T: 'static,
        G: for<'a> Fn(&'a O) -> &'a T + Send + Sync + 'static,
        S: Fn(&mut O, T) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            get: Box::new(move |object: &dyn Any| {
                object.downcast_ref::<O>().map(|owner| get(owner) as &dyn Any)
            }),
            set: Box::new(move |object: &mut dyn Any, value: Box<dyn Any>| {
                let owner = downcast_owner::<O>(object)?;
                set(owner, *downcast_value::<T>(value)?);
                Ok(())
            }),
        }
    }

    /// Accessor for a field whose value may be absent; an absent value is
    /// omitted on write.
    pub fn optional<O, T, G, S>(name: impl Into<String>, get: G, set: S) -> Self
    where
        O: 'static,
        T: 'static,
        G: for<'a> Fn(&'a O) -> Option<&'a T> + Send + Sync + 'static,
        S: Fn(&mut O, T) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            get: Box::new(move |object: &dyn Any| {
                let owner = object.downcast_ref::<O>()?;
                get(owner).map(|value| value as &dyn Any)
            }),
            set: Box::new(move |object: &mut dyn Any, value: Box<dyn Any>| {
                let owner = downcast_owner::<O>(object)?;
                set(owner, *downcast_value::<T>(value)?);
                Ok(())
            }),
        }
    }

    /// Field name, for diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the field; `None` when the value is absent.
    #[must_use]
    pub fn get<'a>(&self, object: &'a dyn Any) -> Option<&'a dyn Any> {
        (self.get)(object)
    }

    /// Assign a value to the field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] when the object or the value is not
    /// of the type this accessor was built for.
    pub fn set(&self, object: &mut dyn Any, value: Box<dyn Any>) -> Result<()> {
        (self.set)(object, value).map_err(|e| e.at_field(&self.name))
    }
}

impl std::fmt::Debug for FieldAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn downcast_owner<O: 'static>(object: &mut dyn Any) -> Result<&mut O> {
    object.downcast_mut::<O>().ok_or_else(|| Error::TypeMismatch {
        field: String::new(),
        expected: type_name::<O>().to_string(),
    })
}

fn downcast_value<T: 'static>(value: Box<dyn Any>) -> Result<Box<T>> {
    value.downcast::<T>().map_err(|_| Error::TypeMismatch {
        field: String::new(),
        expected: type_name::<T>().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Person {
        name: String,
        nickname: Option<String>,
    }

    fn name_field() -> FieldAccessor {
        FieldAccessor::new("name", |p: &Person| &p.name, |p, v| p.name = v)
    }

    #[test]
    fn test_set_then_get() {
        let accessor = name_field();
        let mut person = Person::default();

        accessor
            .set(&mut person, Box::new("Alice".to_string()))
            .unwrap();
        assert_eq!(person.name, "Alice");

        let value = accessor.get(&person).unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "Alice");
    }

    #[test]
    fn test_optional_field_absent_reads_none() {
        let accessor = FieldAccessor::optional(
            "nickname",
            |p: &Person| p.nickname.as_ref(),
            |p, v| p.nickname = Some(v),
        );
        let mut person = Person::default();

        assert!(accessor.get(&person).is_none());
        accessor.set(&mut person, Box::new("Al".to_string())).unwrap();
        assert_eq!(person.nickname.as_deref(), Some("Al"));
        assert!(accessor.get(&person).is_some());
    }

    #[test]
    fn test_set_wrong_value_type_names_field() {
        let accessor = name_field();
        let mut person = Person::default();

        let err = accessor.set(&mut person, Box::new(42i32)).unwrap_err();
        match err {
            Error::TypeMismatch { field, .. } => assert_eq!(field, "name"),
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_set_wrong_owner_type_fails() {
        let accessor = name_field();
        let mut not_a_person = 7i64;

        let err = accessor
            .set(&mut not_a_person, Box::new("Alice".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }
}
