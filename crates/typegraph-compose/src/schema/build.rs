//! Turns the composed graph into an executable schema.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use async_graphql::dynamic::{self, Schema};
use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use super::{DirectiveDefinition, SchemaComposer};
use crate::Result;
use crate::composers::{NamedTypeComposer, ObjectTypeComposer};
use crate::config::ComposerConfig;
use crate::error::ComposeError;
use crate::names::{self, MUTATION, QUERY, SUBSCRIPTION};

/// Per-build options.
#[derive(Clone)]
pub struct BuildOptions {
    pub max_depth: Option<usize>,
    pub max_complexity: Option<usize>,
    pub introspection: bool,
    pub prune_empty_types: bool,
    pub keep_unused_types: bool,
    /// Types emitted even when no root field reaches them.
    pub extra_types: Vec<NamedTypeComposer>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        ComposerConfig::default().to_build_options()
    }
}

impl BuildOptions {
    #[must_use]
    pub fn extra_type(mut self, tc: impl Into<NamedTypeComposer>) -> Self {
        self.extra_types.push(tc.into());
        self
    }
}

impl fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let extra: Vec<String> = self.extra_types.iter().map(NamedTypeComposer::get_type_name).collect();
        f.debug_struct("BuildOptions")
            .field("max_depth", &self.max_depth)
            .field("max_complexity", &self.max_complexity)
            .field("introspection", &self.introspection)
            .field("prune_empty_types", &self.prune_empty_types)
            .field("keep_unused_types", &self.keep_unused_types)
            .field("extra_types", &extra)
            .finish()
    }
}

/// Engine types ready to be registered with `dynamic::Schema::build`.
pub struct SchemaConfig {
    pub query_name: String,
    pub query: dynamic::Object,
    pub mutation: Option<(String, dynamic::Object)>,
    pub subscription: Option<(String, dynamic::Subscription)>,
    /// Every other emitted type, in discovery order.
    pub types: Vec<dynamic::Type>,
    pub directives: Vec<DirectiveDefinition>,
    /// Names of every emitted type, roots included.
    pub type_names: Vec<String>,
    /// Types left out because they ended up without fields.
    pub pruned: Vec<String>,
}

impl fmt::Debug for SchemaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaConfig")
            .field("query", &self.query_name)
            .field("mutation", &self.mutation.as_ref().map(|(name, _)| name))
            .field("subscription", &self.subscription.as_ref().map(|(name, _)| name))
            .field("type_names", &self.type_names)
            .field("directives", &self.directives.len())
            .field("pruned", &self.pruned)
            .finish()
    }
}

/// Type names each type depends on to stay non-empty.
enum Liveness {
    Leaf(bool),
    /// (field type, argument types) per field.
    Fields(Vec<(String, Vec<String>)>),
    Members(Vec<String>),
}

impl Liveness {
    fn of(tc: &NamedTypeComposer) -> Result<Self> {
        Ok(match tc {
            NamedTypeComposer::Scalar(_) => Self::Leaf(true),
            NamedTypeComposer::Enum(etc) => Self::Leaf(!etc.get_field_names().is_empty()),
            NamedTypeComposer::Object(otc) => Self::Fields(output_deps(&otc.get_fields()?)?),
            NamedTypeComposer::Interface(iftc) => Self::Fields(output_deps(&iftc.get_fields()?)?),
            NamedTypeComposer::Input(itc) => {
                let mut deps = Vec::new();
                for field in itc.get_fields()?.values() {
                    deps.push((field.type_.get_type_name()?, Vec::new()));
                }
                Self::Fields(deps)
            }
            NamedTypeComposer::Union(utc) => {
                Self::Members(utc.get_types()?.iter().map(ObjectTypeComposer::get_type_name).collect())
            }
        })
    }
}

fn output_deps(fields: &IndexMap<String, crate::composers::FieldConfig>) -> Result<Vec<(String, Vec<String>)>> {
    let mut deps = Vec::with_capacity(fields.len());
    for field in fields.values() {
        let mut args = Vec::with_capacity(field.args.len());
        for arg in field.args.values() {
            args.push(arg.type_.get_type_name()?);
        }
        deps.push((field.type_.get_type_name()?, args));
    }
    Ok(deps)
}

/// Least fixed point: a type is alive once one of its fields (or members)
/// points at a live type. Cycles without a live exit stay dead.
fn alive_types(types: &IndexMap<String, NamedTypeComposer>) -> Result<HashSet<String>> {
    let mut shapes = Vec::with_capacity(types.len());
    for (name, tc) in types {
        shapes.push((name.as_str(), Liveness::of(tc)?));
    }

    let mut alive: HashSet<String> = HashSet::new();
    let is_alive = |alive: &HashSet<String>, name: &str| alive.contains(name) || !types.contains_key(name);
    loop {
        let mut changed = false;
        for (name, shape) in &shapes {
            if alive.contains(*name) {
                continue;
            }
            let live = match shape {
                Liveness::Leaf(live) => *live,
                Liveness::Fields(fields) => fields.iter().any(|(target, args)| {
                    is_alive(&alive, target) && args.iter().all(|arg| is_alive(&alive, arg))
                }),
                Liveness::Members(members) => members.iter().any(|member| is_alive(&alive, member)),
            };
            if live {
                alive.insert((*name).to_string());
                changed = true;
            }
        }
        if !changed {
            return Ok(alive);
        }
    }
}

impl SchemaComposer {
    /// Build options derived from this composer's config.
    pub fn build_options(&self) -> BuildOptions {
        self.config().to_build_options()
    }

    fn root(&self, name: &str) -> Result<Option<ObjectTypeComposer>> {
        if !self.has(name) {
            return Ok(None);
        }
        self.get_otc(name).map(Some)
    }

    /// Collects the roots, must-have types, extra types and everything they
    /// reach, including objects implementing a reachable interface.
    fn reachable_types(
        &self,
        roots: &[ObjectTypeComposer],
        opts: &BuildOptions,
    ) -> Result<IndexMap<String, NamedTypeComposer>> {
        let mut queue: VecDeque<NamedTypeComposer> = roots.iter().cloned().map(NamedTypeComposer::Object).collect();
        queue.extend(self.get_schema_must_have_types());
        queue.extend(opts.extra_types.iter().cloned());
        if opts.keep_unused_types {
            queue.extend(self.values());
        }

        let mut seen: IndexMap<String, NamedTypeComposer> = IndexMap::new();
        while let Some(tc) = queue.pop_front() {
            let name = tc.get_type_name();
            if let Some(existing) = seen.get(&name) {
                if !existing.ptr_eq(&tc) {
                    return Err(ComposeError::SchemaBuildFailed(format!(
                        "two different types are named `{name}`"
                    )));
                }
                continue;
            }
            trace!(type_name = %name, "Collecting type");
            queue.extend(tc.referenced_types().map_err(|e| e.at_path(name.clone()))?);

            let implementors: Vec<ObjectTypeComposer> = match &tc {
                NamedTypeComposer::Interface(iftc) => {
                    let mut objects: Vec<ObjectTypeComposer> =
                        iftc.get_type_resolvers().into_iter().map(|(otc, _)| otc).collect();
                    for candidate in self.values() {
                        if let NamedTypeComposer::Object(otc) = candidate
                            && otc.has_interface(&name)
                        {
                            objects.push(otc);
                        }
                    }
                    objects
                }
                NamedTypeComposer::Union(utc) => utc.get_type_resolvers().into_iter().map(|(otc, _)| otc).collect(),
                _ => Vec::new(),
            };
            queue.extend(implementors.into_iter().map(NamedTypeComposer::Object));
            seen.insert(name, tc);
        }
        Ok(seen)
    }

    /// Assembles the engine types without building the schema.
    ///
    /// # Errors
    ///
    /// - `NoRootType` if no `Query` type was created
    /// - `WrongKind` if a root name is taken by a non-object type
    /// - `SchemaBuildFailed` if `Query` ends up without fields, or two
    ///   distinct composers share a name
    /// - any error raised while forcing a deferred reference
    pub fn build_schema_config(&self, opts: &BuildOptions) -> Result<SchemaConfig> {
        let query = self.root(QUERY)?.ok_or(ComposeError::NoRootType)?;
        let mutation = self.root(MUTATION)?;
        let subscription = self.root(SUBSCRIPTION)?;

        let mut roots = vec![query.clone()];
        roots.extend(mutation.iter().cloned());
        roots.extend(subscription.iter().cloned());
        let types = self.reachable_types(&roots, opts)?;
        debug!(types = types.len(), "Collected schema types");

        let alive = if opts.prune_empty_types {
            alive_types(&types)?
        } else {
            types.keys().cloned().collect()
        };
        let dead: HashSet<String> = types.keys().filter(|name| !alive.contains(*name)).cloned().collect();
        if !dead.is_empty() {
            debug!(pruned = dead.len(), "Pruned empty types");
        }

        let query_name = query.get_type_name();
        if dead.contains(&query_name) {
            return Err(ComposeError::SchemaBuildFailed(format!(
                "root type `{query_name}` has no fields"
            )));
        }
        let query_type = query.build_type(&dead)?;

        let mutation = match mutation {
            Some(otc) if !dead.contains(&otc.get_type_name()) => {
                Some((otc.get_type_name(), otc.build_type(&dead)?))
            }
            Some(otc) => {
                warn!(type_name = %otc.get_type_name(), "Skipping empty root type");
                None
            }
            None => None,
        };
        let subscription = match subscription {
            Some(otc) if !dead.contains(&otc.get_type_name()) => {
                Some((otc.get_type_name(), otc.build_subscription(&dead)?))
            }
            Some(otc) => {
                warn!(type_name = %otc.get_type_name(), "Skipping empty root type");
                None
            }
            None => None,
        };

        let root_names: HashSet<String> = roots.iter().map(ObjectTypeComposer::get_type_name).collect();

        let mut type_names = vec![query_name.clone()];
        type_names.extend(mutation.as_ref().map(|(name, _)| name.clone()));
        type_names.extend(subscription.as_ref().map(|(name, _)| name.clone()));

        let mut emitted = Vec::with_capacity(types.len());
        for (name, tc) in &types {
            if dead.contains(name) || root_names.contains(name) || names::is_spec_scalar(name) {
                continue;
            }
            let ty: dynamic::Type = match tc {
                NamedTypeComposer::Object(otc) => otc.build_type(&dead)?.into(),
                NamedTypeComposer::Input(itc) => itc.build_type(&dead)?.into(),
                NamedTypeComposer::Enum(etc) => etc.get_type().into(),
                NamedTypeComposer::Scalar(stc) => stc.get_type().into(),
                NamedTypeComposer::Interface(iftc) => iftc.build_type(&dead)?.into(),
                NamedTypeComposer::Union(utc) => utc.build_type(&dead)?.into(),
            };
            emitted.push(ty);
            type_names.push(name.clone());
        }

        let mut pruned: Vec<String> = dead.into_iter().collect();
        pruned.sort();

        Ok(SchemaConfig {
            query_name,
            query: query_type,
            mutation,
            subscription,
            types: emitted,
            directives: self.get_directives(),
            type_names,
            pruned,
        })
    }

    /// Builds the executable schema.
    ///
    /// # Errors
    ///
    /// Everything [`build_schema_config`](Self::build_schema_config) returns,
    /// plus `SchemaBuildFailed` when the engine rejects the assembled types.
    pub fn build_schema(&self, opts: &BuildOptions) -> Result<Schema> {
        debug!("Starting schema build");
        let config = self.build_schema_config(opts)?;

        let mut builder = Schema::build(
            config.query_name.as_str(),
            config.mutation.as_ref().map(|(name, _)| name.as_str()),
            config.subscription.as_ref().map(|(name, _)| name.as_str()),
        )
        .register(config.query);
        if let Some((_, mutation)) = config.mutation {
            builder = builder.register(mutation);
        }
        if let Some((_, subscription)) = config.subscription {
            builder = builder.register(subscription);
        }
        for ty in config.types {
            builder = builder.register(ty);
        }

        if let Some(depth) = opts.max_depth {
            builder = builder.limit_depth(depth);
        }
        if let Some(complexity) = opts.max_complexity {
            builder = builder.limit_complexity(complexity);
        }
        if !opts.introspection {
            builder = builder.disable_introspection();
        }

        let schema = builder
            .finish()
            .map_err(|e| ComposeError::SchemaBuildFailed(e.to_string()))?;
        debug!(types = config.type_names.len(), "Schema build complete");
        Ok(schema)
    }

    /// Builds with the composer's own options.
    ///
    /// # Errors
    ///
    /// See [`build_schema`](Self::build_schema).
    pub fn build(&self) -> Result<Schema> {
        self.build_schema(&self.build_options())
    }

    /// Prints the schema SDL, custom directive definitions first.
    ///
    /// # Errors
    ///
    /// See [`build_schema`](Self::build_schema).
    pub fn print_schema(&self) -> Result<String> {
        let schema = self.build()?;
        let mut out = String::new();
        for directive in self.get_directives() {
            if directive.is_builtin() {
                continue;
            }
            out.push_str(&directive.to_sdl()?);
            out.push_str("\n\n");
        }
        out.push_str(&schema.sdl());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_root_type() {
        let sc = SchemaComposer::new();
        sc.create_object_tc("type User { id: ID }").unwrap();
        let err = sc.build_schema(&BuildOptions::default()).unwrap_err();
        assert_eq!(err.error_code(), "NO_ROOT_TYPE");
    }

    #[test]
    fn test_root_of_wrong_kind() {
        let sc = SchemaComposer::new();
        let input = sc.create_input_tc("input QueryInput { a: Int }").unwrap();
        sc.set("Query", input);
        let err = sc.build_schema_config(&BuildOptions::default()).unwrap_err();
        assert_eq!(err.error_code(), "WRONG_KIND");
    }

    #[test]
    fn test_cycle_without_exit_is_pruned() {
        let sc = SchemaComposer::new();
        sc.add_type_defs(
            r#"
            type A { a: A }
            type B { b: B name: String }
            type Query { a: A b: B ok: Int }
            "#,
        )
        .unwrap();

        let config = sc.build_schema_config(&BuildOptions::default()).unwrap();
        assert_eq!(config.pruned, vec!["A"]);
        assert!(config.type_names.contains(&"B".to_string()));
        assert!(!config.type_names.contains(&"A".to_string()));

        let sdl = sc.build_schema(&BuildOptions::default()).unwrap().sdl();
        assert!(!sdl.contains("type A"));
        assert!(sdl.contains("b: B"));
    }

    #[test]
    fn test_empty_query_fails() {
        let sc = SchemaComposer::new();
        sc.query().unwrap();
        let err = sc.build_schema_config(&BuildOptions::default()).unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_BUILD_FAILED");
    }

    #[test]
    fn test_unused_types_only_when_asked() {
        let sc = SchemaComposer::new();
        sc.add_type_defs("type Query { ok: Int } type Orphan { id: ID }").unwrap();

        let config = sc.build_schema_config(&BuildOptions::default()).unwrap();
        assert!(!config.type_names.contains(&"Orphan".to_string()));

        let opts = BuildOptions {
            keep_unused_types: true,
            ..BuildOptions::default()
        };
        let config = sc.build_schema_config(&opts).unwrap();
        assert!(config.type_names.contains(&"Orphan".to_string()));

        let orphan = sc.get("Orphan").unwrap();
        let config = sc
            .build_schema_config(&BuildOptions::default().extra_type(orphan))
            .unwrap();
        assert!(config.type_names.contains(&"Orphan".to_string()));
    }

    #[test]
    fn test_interface_implementors_are_emitted() {
        let sc = SchemaComposer::new();
        sc.add_type_defs(
            r#"
            interface Node { id: ID! }
            type User implements Node { id: ID! name: String }
            type Query { node: Node }
            "#,
        )
        .unwrap();
        let config = sc.build_schema_config(&BuildOptions::default()).unwrap();
        assert!(config.type_names.contains(&"User".to_string()));
        assert!(config.type_names.contains(&"Node".to_string()));
    }

    #[test]
    fn test_print_schema_includes_custom_directives() {
        let sc = SchemaComposer::new();
        sc.add_type_defs("directive @cached on FIELD_DEFINITION type Query { ok: Int }")
            .unwrap();
        let sdl = sc.print_schema().unwrap();
        assert!(sdl.starts_with("directive @cached on FIELD_DEFINITION"));
        assert!(sdl.contains("ok: Int"));
    }
}
