//! Error types for type-graph composition.
//!
//! Every construction-time failure is reported synchronously through
//! [`ComposeError`]. Execution-time failures (inside a resolve function)
//! use `async_graphql::Error` instead, since they travel through the
//! execution engine.

use std::fmt;

use thiserror::Error;

/// What kind of entity a [`ComposeError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    Type,
    Field,
    Argument,
    Resolver,
    EnumValue,
    Directive,
    RecordIdFn,
}

impl fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Type => "Type",
            Self::Field => "Field",
            Self::Argument => "Argument",
            Self::Resolver => "Resolver",
            Self::EnumValue => "Enum value",
            Self::Directive => "Directive",
            Self::RecordIdFn => "Record id function",
        };
        f.write_str(label)
    }
}

/// Errors raised while building or mutating a type graph.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// A composer or resolver was used without (or against) its owning schema composer.
    #[error("Ownership error: {0}")]
    Ownership(String),

    /// A registry entry, field, argument, resolver or enum value is missing.
    #[error("{kind} `{name}` not found{}", in_owner(.owner))]
    NotFound {
        kind: NotFoundKind,
        name: String,
        owner: Option<String>,
    },

    /// Empty or invalid type name, clone-to-self, or a required fallback name was omitted.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Input type where an output type was expected (or vice versa), or a composer of the wrong variant.
    #[error("Wrong kind: {0}")]
    WrongKind(String),

    /// Definition text that fails to parse, or options missing a required part.
    #[error("Malformed definition: {0}")]
    MalformedDefinition(String),

    /// An error raised while resolving a deferred reference, with the field or argument path attached.
    #[error("{path}: {source}")]
    AtPath {
        path: String,
        #[source]
        source: Box<ComposeError>,
    },

    /// `build_schema` was called before any Query type was created.
    #[error("Schema must contain a Query root type")]
    NoRootType,

    /// The execution engine rejected the assembled schema.
    #[error("Failed to build schema: {0}")]
    SchemaBuildFailed(String),
}

fn in_owner(owner: &Option<String>) -> String {
    owner
        .as_deref()
        .map(|owner| format!(" in {owner}"))
        .unwrap_or_default()
}

impl ComposeError {
    pub fn type_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: NotFoundKind::Type,
            name: name.into(),
            owner: None,
        }
    }

    pub fn field_not_found(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: NotFoundKind::Field,
            name: name.into(),
            owner: Some(owner.into()),
        }
    }

    pub fn arg_not_found(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: NotFoundKind::Argument,
            name: name.into(),
            owner: Some(owner.into()),
        }
    }

    pub fn resolver_not_found(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: NotFoundKind::Resolver,
            name: name.into(),
            owner: Some(owner.into()),
        }
    }

    pub fn enum_value_not_found(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: NotFoundKind::EnumValue,
            name: name.into(),
            owner: Some(owner.into()),
        }
    }

    pub fn invalid_name(msg: impl Into<String>) -> Self {
        Self::InvalidName(msg.into())
    }

    pub fn wrong_kind(msg: impl Into<String>) -> Self {
        Self::WrongKind(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedDefinition(msg.into())
    }

    pub fn ownership(msg: impl Into<String>) -> Self {
        Self::Ownership(msg.into())
    }

    /// Attaches the field/argument path that triggered the failure.
    ///
    /// Paths nest outward: an error already carrying `B.c` that is re-raised
    /// while materializing `A.b` reads `A.b: B.c: ...`.
    #[must_use]
    pub fn at_path(self, path: impl Into<String>) -> Self {
        Self::AtPath {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping any path context.
    pub fn root_cause(&self) -> &ComposeError {
        match self {
            Self::AtPath { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns the stable error code for this error kind.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ownership(_) => "OWNERSHIP_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidName(_) => "INVALID_NAME",
            Self::WrongKind(_) => "WRONG_KIND",
            Self::MalformedDefinition(_) => "MALFORMED_DEFINITION",
            Self::AtPath { source, .. } => source.error_code(),
            Self::NoRootType => "NO_ROOT_TYPE",
            Self::SchemaBuildFailed(_) => "SCHEMA_BUILD_FAILED",
        }
    }
}

impl From<async_graphql_parser::Error> for ComposeError {
    fn from(err: async_graphql_parser::Error) -> Self {
        Self::MalformedDefinition(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = ComposeError::field_not_found("User", "email");
        assert_eq!(err.to_string(), "Field `email` not found in User");

        let err = ComposeError::type_not_found("Missing");
        assert_eq!(err.to_string(), "Type `Missing` not found");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ComposeError::NoRootType.error_code(), "NO_ROOT_TYPE");
        assert_eq!(ComposeError::wrong_kind("x").error_code(), "WRONG_KIND");
        assert_eq!(
            ComposeError::invalid_name("x").at_path("A.b").error_code(),
            "INVALID_NAME"
        );
    }

    #[test]
    fn test_at_path_nesting() {
        let err = ComposeError::type_not_found("Ghost")
            .at_path("Post.author")
            .at_path("Query.posts");
        assert_eq!(
            err.to_string(),
            "Query.posts: Post.author: Type `Ghost` not found"
        );
        assert!(matches!(
            err.root_cause(),
            ComposeError::NotFound {
                kind: NotFoundKind::Type,
                ..
            }
        ));
    }
}
