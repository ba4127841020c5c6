//! Derives an input object type from an object type.
//!
//! `User { id: ID!, friends: [User], avatar(size: Int): String }` becomes
//! `UserInput { id: ID!, friends: [UserInput], avatar: String }`. Arguments,
//! resolvers and relation fields are not carried over; interface and union
//! typed fields are dropped.

use tracing::{debug, trace};

use crate::Result;
use crate::composers::{ArgumentConfig, InputTypeComposer, NamedTypeComposer, ObjectTypeComposer};
use crate::error::ComposeError;
use crate::mapper::{InputFieldDef, InputTypeConfig};
use crate::type_ref::TypeReference;

const INPUT_TYPE_SUFFIX: &str = "Input";

pub(crate) fn to_input_type_composer(otc: &ObjectTypeComposer) -> Result<InputTypeComposer> {
    if let Some(itc) = otc.inner.borrow().input_tc.clone() {
        return Ok(itc);
    }

    let sc = otc.schema_composer()?;
    let input_name = format!("{}{INPUT_TYPE_SUFFIX}", otc.get_type_name());
    if let Ok(NamedTypeComposer::Input(existing)) = sc.get(&input_name) {
        otc.inner.borrow_mut().input_tc = Some(existing.clone());
        return Ok(existing);
    }

    let mut config = InputTypeConfig::new(input_name.as_str());
    config.description = otc.get_description();
    let itc = InputTypeComposer::create(config, &sc)?;
    // Cached before the fields are converted so self references find it.
    otc.inner.borrow_mut().input_tc = Some(itc.clone());
    debug!(type_name = %otc.get_type_name(), input = %input_name, "Deriving input type");

    let relations = otc.get_relations();
    let mut fields = Vec::new();
    for (name, field) in otc.get_fields()? {
        if relations.contains_key(&name) {
            trace!(field = %name, "Skipping relation field");
            continue;
        }
        let Some(type_) = convert_type(&field.type_)? else {
            trace!(field = %name, "Skipping abstract-typed field");
            continue;
        };
        let mut input_field = ArgumentConfig::new(type_);
        input_field.description = field.description;
        input_field.deprecation_reason = field.deprecation_reason;
        input_field.directives = field.directives;
        fields.push((name, InputFieldDef::Definition(input_field.into())));
    }
    super::fields::set_fields(&itc, fields)?;

    Ok(itc)
}

/// Maps an output type to its input counterpart, keeping every wrapper.
/// Returns `None` for interface and union types.
fn convert_type(type_: &TypeReference) -> Result<Option<TypeReference>> {
    let named = type_.named_composer()?;
    let replacement = match &named {
        NamedTypeComposer::Object(otc) => NamedTypeComposer::Input(to_input_type_composer(otc)?),
        NamedTypeComposer::Interface(_) | NamedTypeComposer::Union(_) => return Ok(None),
        NamedTypeComposer::Scalar(_) | NamedTypeComposer::Enum(_) | NamedTypeComposer::Input(_) => {
            named.clone()
        }
    };
    let converted = type_.map_named(|_| Ok(replacement))?;
    if converted.peek_named().is_some_and(|tc| !tc.is_input_type()) {
        return Err(ComposeError::wrong_kind(format!(
            "cannot use `{}` as an input type",
            named.get_type_name()
        )));
    }
    Ok(Some(converted))
}

#[cfg(test)]
mod tests {
    use crate::SchemaComposer;

    #[test]
    fn test_person_input_has_same_fields() {
        let sc = SchemaComposer::new();
        let person = sc
            .create_object_tc("type Person { name: String, age: Int }")
            .unwrap();

        let itc = person.get_input_type_composer().unwrap();
        assert_eq!(itc.get_type_name(), "PersonInput");
        assert_eq!(itc.get_field_names(), vec!["name", "age"]);
        assert_eq!(itc.get_field_type_name("name").unwrap(), "String");
        assert_eq!(itc.get_field_type_name("age").unwrap(), "Int");
        assert!(sc.has("PersonInput"));
        assert!(person.get_input_type_composer().unwrap().ptr_eq(&itc));
    }

    #[test]
    fn test_self_reference_and_abstract_fields() {
        let sc = SchemaComposer::new();
        sc.add_type_defs(
            r#"
            interface Node { id: ID! }
            type User implements Node {
                id: ID!
                friends: [User!]!
                node: Node
                avatar(size: Int): String
            }
            "#,
        )
        .unwrap();
        let user = sc.get_otc("User").unwrap();

        let itc = user.get_input_type_composer().unwrap();
        assert_eq!(itc.get_field_names(), vec!["id", "friends", "avatar"]);
        assert_eq!(
            itc.get_field_type("friends").unwrap().type_string().unwrap(),
            "[UserInput!]!"
        );
    }
}
