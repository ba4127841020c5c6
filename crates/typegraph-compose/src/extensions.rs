//! Extension metadata and applied directives.
//!
//! Extensions are an opaque metadata bag carried by composers, fields,
//! arguments and resolvers. They never reach the executable schema.

use async_graphql::Value;
use indexmap::IndexMap;

use crate::names::DEFAULT_DEPRECATION_REASON;

/// Opaque metadata keyed by name.
pub type Extensions = IndexMap<String, serde_json::Value>;

/// A directive applied to a type, field, argument or enum value.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: String,
    pub args: IndexMap<String, Value>,
}

impl Directive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    /// `@deprecated(reason: ...)`.
    pub fn deprecated(reason: impl Into<String>) -> Self {
        Self::new("deprecated").arg("reason", Value::String(reason.into()))
    }

    pub fn get_arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }
}

/// Merges `patch` into `target` key by key.
pub(crate) fn merge_extensions(target: &mut Extensions, patch: Extensions) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

/// Reads the reason carried by a `@deprecated` directive in `directives`.
///
/// A directive without a `reason` argument yields the default reason.
pub(crate) fn deprecation_from_directives(directives: &[Directive]) -> Option<String> {
    directives
        .iter()
        .find(|d| d.name == "deprecated")
        .map(|d| match d.get_arg("reason") {
            Some(Value::String(reason)) => reason.clone(),
            _ => DEFAULT_DEPRECATION_REASON.to_string(),
        })
}

/// Sets a deprecation reason and rewrites the `@deprecated` directive to match.
pub(crate) fn set_deprecation(
    reason_slot: &mut Option<String>,
    directives: &mut Vec<Directive>,
    reason: Option<String>,
) {
    directives.retain(|d| d.name != "deprecated");
    if let Some(reason) = &reason {
        directives.push(Directive::deprecated(reason.clone()));
    }
    *reason_slot = reason;
}

/// Replaces the directive list and derives the deprecation reason from it.
pub(crate) fn set_directives(
    reason_slot: &mut Option<String>,
    directives_slot: &mut Vec<Directive>,
    directives: Vec<Directive>,
) {
    *reason_slot = deprecation_from_directives(&directives);
    *directives_slot = directives;
}

/// Reconciles a freshly built definition: an explicit reason wins,
/// otherwise a `@deprecated` directive supplies it.
pub(crate) fn reconcile_deprecation(reason_slot: &mut Option<String>, directives: &mut Vec<Directive>) {
    match reason_slot.clone() {
        Some(reason) => set_deprecation(reason_slot, directives, Some(reason)),
        None => *reason_slot = deprecation_from_directives(directives),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_deprecation_updates_directive() {
        let mut reason = None;
        let mut directives = vec![Directive::new("key")];

        set_deprecation(&mut reason, &mut directives, Some("use fullName".into()));
        assert_eq!(reason.as_deref(), Some("use fullName"));
        assert_eq!(directives.len(), 2);
        assert_eq!(
            directives[1].get_arg("reason"),
            Some(&Value::String("use fullName".into()))
        );

        set_deprecation(&mut reason, &mut directives, None);
        assert!(reason.is_none());
        assert_eq!(directives, vec![Directive::new("key")]);
    }

    #[test]
    fn test_set_directives_derives_reason() {
        let mut reason = Some("old".to_string());
        let mut directives = Vec::new();

        set_directives(&mut reason, &mut directives, vec![Directive::new("deprecated")]);
        assert_eq!(reason.as_deref(), Some(DEFAULT_DEPRECATION_REASON));

        set_directives(&mut reason, &mut directives, vec![]);
        assert!(reason.is_none());
    }

    #[test]
    fn test_reconcile_prefers_explicit_reason() {
        let mut reason = Some("explicit".to_string());
        let mut directives = vec![Directive::deprecated("from directive")];
        reconcile_deprecation(&mut reason, &mut directives);
        assert_eq!(reason.as_deref(), Some("explicit"));
        assert_eq!(deprecation_from_directives(&directives).as_deref(), Some("explicit"));
    }
}
