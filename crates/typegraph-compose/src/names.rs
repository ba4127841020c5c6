//! Name rules shared by the registry, the type mapper and the composers.

use std::sync::LazyLock;

/// Root operation type names.
pub const QUERY: &str = "Query";
pub const MUTATION: &str = "Mutation";
pub const SUBSCRIPTION: &str = "Subscription";

/// Scalars every GraphQL execution engine provides on its own.
pub const SPEC_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// Additional scalars synthesized on first reference.
pub const EXTRA_SCALARS: [(&str, &str); 3] = [
    ("JSON", "The `JSON` scalar type represents JSON values."),
    (
        "JSONObject",
        "The `JSONObject` scalar type represents JSON objects.",
    ),
    ("Date", "A date, serialized as an ISO-8601 string."),
];

/// Deprecation reason used when none is given.
pub const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

/// Wrapped type notation like `[String!]!`.
static WRAPPED_TYPE_NAME: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^\[*[_A-Za-z][_0-9A-Za-z]*(!?\]!?)*!?$").expect("Invalid wrapped type name regex")
});

/// Checks if a string is a valid GraphQL name (`/^[_A-Za-z][_0-9A-Za-z]*$/`).
pub fn is_valid_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }

    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Checks if a string is a bare type name wrapped in list/non-null markers,
/// e.g. `Int!`, `[User]`, `[[ID!]!]`.
pub fn is_wrapped_type_name(text: &str) -> bool {
    let text = text.trim();
    if is_valid_graphql_name(text) || !WRAPPED_TYPE_NAME.is_match(text) {
        return false;
    }

    let opening = text.chars().filter(|c| *c == '[').count();
    let closing = text.chars().filter(|c| *c == ']').count();
    opening == closing
}

/// Returns true for the five scalars built into every engine.
pub fn is_spec_scalar(name: &str) -> bool {
    SPEC_SCALARS.contains(&name)
}

/// Returns the description for a built-in scalar, or `None` if the name is not built in.
pub fn builtin_scalar_description(name: &str) -> Option<&'static str> {
    match name {
        "String" => Some(
            "The `String` scalar type represents textual data, represented as UTF-8 character sequences.",
        ),
        "Int" => Some("The `Int` scalar type represents non-fractional signed whole numeric values."),
        "Float" => Some(
            "The `Float` scalar type represents signed double-precision fractional values.",
        ),
        "Boolean" => Some("The `Boolean` scalar type represents `true` or `false`."),
        "ID" => Some("The `ID` scalar type represents a unique identifier."),
        _ => EXTRA_SCALARS
            .iter()
            .find(|(scalar, _)| *scalar == name)
            .map(|(_, description)| *description),
    }
}

/// Returns true for the root operation type names.
pub fn is_root_type_name(name: &str) -> bool {
    matches!(name, QUERY | MUTATION | SUBSCRIPTION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_graphql_names() {
        assert!(is_valid_graphql_name("User"));
        assert!(is_valid_graphql_name("_private"));
        assert!(is_valid_graphql_name("Type2"));
        assert!(!is_valid_graphql_name(""));
        assert!(!is_valid_graphql_name("2Fast"));
        assert!(!is_valid_graphql_name("us-core-patient"));
        assert!(!is_valid_graphql_name("User Input"));
    }

    #[test]
    fn test_wrapped_type_names() {
        assert!(is_wrapped_type_name("Int!"));
        assert!(is_wrapped_type_name("[User]"));
        assert!(is_wrapped_type_name("[[ID!]!]!"));
        assert!(!is_wrapped_type_name("User"));
        assert!(!is_wrapped_type_name("[User"));
        assert!(!is_wrapped_type_name("type User { id: ID }"));
    }

    #[test]
    fn test_builtin_scalars() {
        assert!(is_spec_scalar("ID"));
        assert!(!is_spec_scalar("JSON"));
        assert!(builtin_scalar_description("JSON").is_some());
        assert!(builtin_scalar_description("Person").is_none());
    }
}
