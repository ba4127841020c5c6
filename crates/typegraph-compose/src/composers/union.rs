use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use async_graphql::dynamic;

use crate::Result;
use crate::composers::{IsTypeOfFn, NamedTypeComposer, ObjectTypeComposer, ResolveTypeFn};
use crate::error::ComposeError;
use crate::extensions::{Directive, Extensions};
use crate::mapper::{TypeDef, UnionTypeConfig};
use crate::schema::{SchemaComposer, WeakSchema};
use crate::type_ref::TypeReference;

pub(crate) struct UnionInner {
    sc: WeakSchema,
    name: String,
    description: Option<String>,
    types: Vec<TypeReference>,
    resolve_type: Option<ResolveTypeFn>,
    type_resolvers: Vec<(ObjectTypeComposer, IsTypeOfFn)>,
    extensions: Extensions,
    directives: Vec<Directive>,
}

/// Composer for a union type.
#[derive(Clone)]
pub struct UnionTypeComposer {
    inner: Rc<RefCell<UnionInner>>,
}

impl_composer_common!(UnionTypeComposer);
impl_composer_factory!(UnionTypeComposer, UnionTypeConfig, Union);
impl_type_resolver_methods!(UnionTypeComposer);

impl UnionTypeComposer {
    pub(crate) fn from_config(config: UnionTypeConfig, sc: &SchemaComposer) -> Result<Self> {
        let tc = Self {
            inner: Rc::new(RefCell::new(UnionInner {
                sc: sc.downgrade(),
                name: config.name,
                description: config.description,
                types: Vec::new(),
                resolve_type: config.resolve_type,
                type_resolvers: Vec::new(),
                extensions: config.extensions,
                directives: config.directives,
            })),
        };
        tc.set_types(config.types)?;
        Ok(tc)
    }

    fn convert_member(&self, def: TypeDef) -> Result<TypeReference> {
        let reference = self.schema_composer()?.type_mapper().convert_output_type_definition(def)?;
        match reference.peek_named() {
            Some(NamedTypeComposer::Object(_)) | None => Ok(reference),
            Some(other) => Err(ComposeError::wrong_kind(format!(
                "union `{}` cannot contain {} `{}`",
                self.get_type_name(),
                other.kind(),
                other.get_type_name()
            ))),
        }
    }

    /// Returns the member types, forcing deferred references.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if a member resolves to something other than an object type.
    pub fn get_types(&self) -> Result<Vec<ObjectTypeComposer>> {
        let refs = self.inner.borrow().types.clone();
        refs.iter()
            .map(|reference| match reference.named_composer()? {
                NamedTypeComposer::Object(tc) => Ok(tc),
                other => Err(ComposeError::wrong_kind(format!(
                    "union `{}` member `{}` is not an object type",
                    self.get_type_name(),
                    other.get_type_name()
                ))),
            })
            .collect()
    }

    pub fn get_type_names(&self) -> Vec<String> {
        self.inner
            .borrow()
            .types
            .iter()
            .filter_map(|reference| reference.get_type_name().ok())
            .collect()
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.get_type_names().iter().any(|n| n == name)
    }

    /// Replaces the member list.
    pub fn set_types<I, D>(&self, types: I) -> Result<&Self>
    where
        I: IntoIterator<Item = D>,
        D: Into<TypeDef>,
    {
        let refs = types
            .into_iter()
            .map(|def| self.convert_member(def.into()))
            .collect::<Result<Vec<_>>>()?;
        self.inner.borrow_mut().types = refs;
        Ok(self)
    }

    /// Adds a member unless one with the same name is present.
    pub fn add_type(&self, def: impl Into<TypeDef>) -> Result<&Self> {
        let reference = self.convert_member(def.into())?;
        if let Ok(name) = reference.get_type_name()
            && self.has_type(&name)
        {
            return Ok(self);
        }
        self.inner.borrow_mut().types.push(reference);
        Ok(self)
    }

    pub fn add_types<I, D>(&self, types: I) -> Result<&Self>
    where
        I: IntoIterator<Item = D>,
        D: Into<TypeDef>,
    {
        for def in types {
            self.add_type(def)?;
        }
        Ok(self)
    }

    pub fn remove_type(&self, name: &str) -> &Self {
        self.inner
            .borrow_mut()
            .types
            .retain(|reference| reference.get_type_name().map(|n| n != name).unwrap_or(true));
        self
    }

    pub fn remove_other_types(&self, keep: &[&str]) -> &Self {
        self.inner.borrow_mut().types.retain(|reference| {
            reference
                .get_type_name()
                .map(|n| keep.contains(&n.as_str()))
                .unwrap_or(false)
        });
        self
    }

    pub fn clear_types(&self) -> &Self {
        self.inner.borrow_mut().types.clear();
        self
    }

    /// Independent copy under `new_name`, not registered.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` for an empty name or the current name.
    pub fn clone_as(&self, new_name: &str) -> Result<Self> {
        super::check_clone_name(&self.get_type_name(), new_name)?;
        let inner = self.inner.borrow();
        Ok(Self {
            inner: Rc::new(RefCell::new(UnionInner {
                sc: inner.sc.clone(),
                name: new_name.to_string(),
                description: inner.description.clone(),
                types: inner.types.clone(),
                resolve_type: inner.resolve_type.clone(),
                type_resolvers: inner.type_resolvers.clone(),
                extensions: inner.extensions.clone(),
                directives: inner.directives.clone(),
            })),
        })
    }

    pub fn get_type(&self) -> Result<dynamic::Union> {
        self.build_type(&HashSet::new())
    }

    /// Builds the engine type without members listed in `dead`.
    pub(crate) fn build_type(&self, dead: &HashSet<String>) -> Result<dynamic::Union> {
        let name = self.get_type_name();
        let mut ty = dynamic::Union::new(name.as_str());
        if let Some(description) = self.get_description() {
            ty = ty.description(description);
        }
        for member in self.get_types()? {
            let member_name = member.get_type_name();
            if !dead.contains(&member_name) {
                ty = ty.possible_type(member_name);
            }
        }
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_members() {
        let sc = SchemaComposer::new();
        sc.add_type_defs("type Cat { meow: String } type Dog { bark: String } enum Kind { A }")
            .unwrap();
        let pet = sc.create_union_tc("union Pet = Cat | Dog").unwrap();

        assert_eq!(pet.get_type_names(), vec!["Cat", "Dog"]);
        pet.add_type("Cat").unwrap();
        assert_eq!(pet.get_types().unwrap().len(), 2);
        assert_eq!(pet.add_type("Kind").unwrap_err().error_code(), "WRONG_KIND");

        pet.remove_type("Cat");
        assert!(!pet.has_type("Cat"));
        pet.clear_types();
        assert!(pet.get_type_names().is_empty());
    }

    #[test]
    fn test_union_forward_reference() {
        let sc = SchemaComposer::new();
        let result = sc.create_union_tc("union Later = Ghost");
        let pet = result.unwrap();
        assert_eq!(pet.get_type_names(), vec!["Ghost"]);

        sc.create_object_tc("type Ghost { boo: String }").unwrap();
        assert_eq!(pet.get_types().unwrap()[0].get_type_name(), "Ghost");
    }
}
