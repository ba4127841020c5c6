//! Structural type references.
//!
//! A [`TypeReference`] is a small tree of list / non-null wrappers around a
//! named composer. The [`TypeReference::Thunk`] variant defers the lookup of
//! its target until first use, which is how forward and circular references
//! between types are expressed.

use std::cell::{Cell, OnceCell};
use std::fmt;
use std::rc::Rc;

use async_graphql::dynamic::TypeRef;
use tracing::trace;

use crate::Result;
use crate::composers::NamedTypeComposer;
use crate::error::ComposeError;

/// Shape of a field, argument or resolver type.
#[derive(Clone)]
pub enum TypeReference {
    /// A named type.
    Named(NamedTypeComposer),
    /// A list of the inner type.
    List(Box<TypeReference>),
    /// The inner type, never null. Never wraps another `NonNull`.
    NonNull(Box<TypeReference>),
    /// A reference resolved on first use.
    Thunk(ThunkComposer),
}

impl TypeReference {
    pub fn named(tc: impl Into<NamedTypeComposer>) -> Self {
        Self::Named(tc.into())
    }

    pub fn list(inner: TypeReference) -> Self {
        Self::List(Box::new(inner))
    }

    /// Wraps `inner` in `NonNull` unless it is already non-null.
    pub fn non_null(inner: TypeReference) -> Self {
        match inner {
            Self::NonNull(_) => inner,
            other => Self::NonNull(Box::new(other)),
        }
    }

    /// Creates a deferred reference. `type_name` is returned by
    /// [`get_type_name`](Self::get_type_name) without forcing the thunk.
    pub fn thunk<F>(resolve: F, type_name: Option<String>) -> Self
    where
        F: Fn() -> Result<TypeReference> + 'static,
    {
        Self::Thunk(ThunkComposer::new(resolve, type_name))
    }

    /// Resolves this reference into the engine's type reference, forcing any thunks.
    ///
    /// # Errors
    ///
    /// Returns the error raised by a deferred reference.
    pub fn get_type(&self) -> Result<TypeRef> {
        match self {
            Self::Named(tc) => Ok(TypeRef::named(tc.get_type_name())),
            Self::List(inner) => Ok(TypeRef::List(Box::new(inner.get_type()?))),
            Self::NonNull(inner) => match inner.get_type()? {
                non_null @ TypeRef::NonNull(_) => Ok(non_null),
                other => Ok(TypeRef::NonNull(Box::new(other))),
            },
            Self::Thunk(thunk) => thunk.force()?.get_type(),
        }
    }

    /// Returns the name of the innermost named type.
    ///
    /// A thunk carrying a name hint answers without being forced.
    pub fn get_type_name(&self) -> Result<String> {
        match self {
            Self::Named(tc) => Ok(tc.get_type_name()),
            Self::List(inner) | Self::NonNull(inner) => inner.get_type_name(),
            Self::Thunk(thunk) => match thunk.type_name_hint() {
                Some(name) => Ok(name.to_string()),
                None => thunk.force()?.get_type_name(),
            },
        }
    }

    /// Renders the wrapped SDL notation, e.g. `[User!]!`.
    pub fn type_string(&self) -> Result<String> {
        match self {
            Self::Named(tc) => Ok(tc.get_type_name()),
            Self::List(inner) => Ok(format!("[{}]", inner.type_string()?)),
            Self::NonNull(inner) => {
                let inner = inner.type_string()?;
                if inner.ends_with('!') {
                    Ok(inner)
                } else {
                    Ok(format!("{inner}!"))
                }
            }
            Self::Thunk(thunk) => thunk.force()?.type_string(),
        }
    }

    /// Returns `[this]` without forcing anything.
    #[must_use]
    pub fn get_type_plural(&self) -> Self {
        Self::list(self.clone())
    }

    /// Returns `this!` without forcing anything.
    #[must_use]
    pub fn get_type_non_null(&self) -> Self {
        Self::non_null(self.clone())
    }

    /// Returns the innermost named composer, forcing thunks on the way.
    pub fn named_composer(&self) -> Result<NamedTypeComposer> {
        match self {
            Self::Named(tc) => Ok(tc.clone()),
            Self::List(inner) | Self::NonNull(inner) => inner.named_composer(),
            Self::Thunk(thunk) => thunk.force()?.named_composer(),
        }
    }

    /// Returns the innermost named composer if it is known without forcing.
    pub fn peek_named(&self) -> Option<NamedTypeComposer> {
        match self {
            Self::Named(tc) => Some(tc.clone()),
            Self::List(inner) | Self::NonNull(inner) => inner.peek_named(),
            Self::Thunk(thunk) => thunk.resolved().and_then(|r| r.peek_named()),
        }
    }

    /// Removes the outer `NonNull`, if any.
    pub fn nullable(&self) -> Result<Self> {
        match self {
            Self::NonNull(inner) => Ok((**inner).clone()),
            Self::Thunk(thunk) => thunk.force()?.nullable(),
            other => Ok(other.clone()),
        }
    }

    /// Removes the outer list (and the non-null wrapper around it), if any.
    pub fn non_plural(&self) -> Result<Self> {
        match self.nullable()? {
            Self::List(inner) => Ok(*inner),
            other => Ok(other),
        }
    }

    pub fn is_non_null(&self) -> Result<bool> {
        match self {
            Self::NonNull(_) => Ok(true),
            Self::Thunk(thunk) => thunk.force()?.is_non_null(),
            _ => Ok(false),
        }
    }

    pub fn is_list(&self) -> Result<bool> {
        match self.nullable()? {
            Self::List(_) => Ok(true),
            Self::Thunk(thunk) => thunk.force()?.is_list(),
            _ => Ok(false),
        }
    }

    /// Rebuilds this reference with the innermost named composer replaced,
    /// keeping every list and non-null wrapper.
    pub fn map_named<F>(&self, f: F) -> Result<Self>
    where
        F: FnOnce(&NamedTypeComposer) -> Result<NamedTypeComposer>,
    {
        match self {
            Self::Named(tc) => Ok(Self::Named(f(tc)?)),
            Self::List(inner) => Ok(Self::list(inner.map_named(f)?)),
            Self::NonNull(inner) => Ok(Self::non_null(inner.map_named(f)?)),
            Self::Thunk(thunk) => thunk.force()?.map_named(f),
        }
    }

    /// Structural equality with composer identity at the leaves.
    pub fn is_same(&self, other: &TypeReference) -> bool {
        match (self, other) {
            (Self::Named(a), Self::Named(b)) => a.ptr_eq(b),
            (Self::List(a), Self::List(b)) | (Self::NonNull(a), Self::NonNull(b)) => a.is_same(b),
            (Self::Thunk(a), Self::Thunk(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(tc) => write!(f, "{}", tc.get_type_name()),
            Self::List(inner) => write!(f, "[{inner:?}]"),
            Self::NonNull(inner) => write!(f, "{inner:?}!"),
            Self::Thunk(thunk) => match thunk.resolved() {
                Some(resolved) => write!(f, "{resolved:?}"),
                None => write!(f, "Thunk({})", thunk.type_name_hint().unwrap_or("?")),
            },
        }
    }
}

impl From<NamedTypeComposer> for TypeReference {
    fn from(tc: NamedTypeComposer) -> Self {
        Self::Named(tc)
    }
}

struct ThunkInner {
    resolve: Box<dyn Fn() -> Result<TypeReference>>,
    cached: OnceCell<TypeReference>,
    resolving: Cell<bool>,
    type_name: Option<String>,
}

/// A memoized deferred type reference.
///
/// The resolve function runs at most once successfully; every later call
/// returns the cached reference.
#[derive(Clone)]
pub struct ThunkComposer {
    inner: Rc<ThunkInner>,
}

impl ThunkComposer {
    pub fn new<F>(resolve: F, type_name: Option<String>) -> Self
    where
        F: Fn() -> Result<TypeReference> + 'static,
    {
        Self {
            inner: Rc::new(ThunkInner {
                resolve: Box::new(resolve),
                cached: OnceCell::new(),
                resolving: Cell::new(false),
                type_name,
            }),
        }
    }

    pub fn type_name_hint(&self) -> Option<&str> {
        self.inner.type_name.as_deref()
    }

    /// Returns the cached reference if the thunk was already forced.
    pub fn resolved(&self) -> Option<&TypeReference> {
        self.inner.cached.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.cached.get().is_some()
    }

    /// Evaluates the thunk on first call and returns the cached reference afterwards.
    ///
    /// # Errors
    ///
    /// Returns the resolve function's error, or `MalformedDefinition` if the
    /// thunk is re-entered while it is being evaluated.
    pub fn force(&self) -> Result<TypeReference> {
        if let Some(cached) = self.inner.cached.get() {
            return Ok(cached.clone());
        }

        if self.inner.resolving.get() {
            return Err(ComposeError::malformed(format!(
                "deferred type reference `{}` depends on itself",
                self.type_name_hint().unwrap_or("?")
            )));
        }

        self.inner.resolving.set(true);
        let result = (self.inner.resolve)();
        self.inner.resolving.set(false);

        let resolved = result?;
        trace!(hint = ?self.type_name_hint(), resolved = ?resolved, "Forced deferred type reference");
        Ok(self.inner.cached.get_or_init(|| resolved).clone())
    }

    pub fn ptr_eq(&self, other: &ThunkComposer) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::SchemaComposer;

    #[test]
    fn test_thunk_is_memoized() {
        let sc = SchemaComposer::new();
        let user = sc.create_object_tc("User").unwrap();
        let calls = Rc::new(Cell::new(0));

        let counter = calls.clone();
        let target = user.clone();
        let reference = TypeReference::thunk(
            move || {
                counter.set(counter.get() + 1);
                Ok(TypeReference::named(target.clone()))
            },
            None,
        );

        let first = reference.named_composer().unwrap();
        let second = reference.named_composer().unwrap();
        assert_eq!(calls.get(), 1);
        assert!(first.ptr_eq(&second));
        assert!(first.ptr_eq(&NamedTypeComposer::Object(user)));
    }

    #[test]
    fn test_thunk_name_hint_does_not_force() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let reference = TypeReference::thunk(
            move || {
                counter.set(counter.get() + 1);
                Err(ComposeError::type_not_found("Later"))
            },
            Some("Later".into()),
        );

        assert_eq!(reference.get_type_name().unwrap(), "Later");
        assert_eq!(calls.get(), 0);
        assert!(reference.get_type().is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_failed_thunk_is_retried() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let thunk = ThunkComposer::new(
            move || {
                counter.set(counter.get() + 1);
                Err(ComposeError::type_not_found("Missing"))
            },
            None,
        );

        assert!(thunk.force().is_err());
        assert!(thunk.force().is_err());
        assert_eq!(calls.get(), 2);
        assert!(!thunk.is_resolved());
    }

    #[test]
    fn test_no_double_non_null() {
        let sc = SchemaComposer::new();
        let string = sc.get_any_tc("String").unwrap();

        let required = TypeReference::named(string).get_type_non_null();
        let twice = required.get_type_non_null();
        assert!(matches!(&twice, TypeReference::NonNull(inner) if matches!(**inner, TypeReference::Named(_))));
        assert_eq!(twice.type_string().unwrap(), "String!");
    }

    #[test]
    fn test_wrappers_render_and_unwrap() {
        let sc = SchemaComposer::new();
        let id = sc.get_any_tc("ID").unwrap();

        let reference = TypeReference::named(id)
            .get_type_non_null()
            .get_type_plural()
            .get_type_non_null();
        assert_eq!(reference.type_string().unwrap(), "[ID!]!");
        assert_eq!(reference.get_type_name().unwrap(), "ID");
        assert!(reference.is_list().unwrap());
        assert!(reference.is_non_null().unwrap());
        assert_eq!(reference.non_plural().unwrap().type_string().unwrap(), "ID!");
        assert_eq!(reference.nullable().unwrap().type_string().unwrap(), "[ID!]");
    }

    #[test]
    fn test_self_dependent_thunk_errors() {
        let slot: Rc<std::cell::RefCell<Option<TypeReference>>> = Rc::default();
        let inner = slot.clone();
        let reference = TypeReference::thunk(
            move || match inner.borrow().as_ref() {
                Some(me) => me.named_composer().map(TypeReference::Named),
                None => Err(ComposeError::type_not_found("Loop")),
            },
            None,
        );
        *slot.borrow_mut() = Some(reference.clone());

        let err = reference.named_composer().unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_DEFINITION");
    }
}
