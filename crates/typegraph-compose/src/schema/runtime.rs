//! Adapters from composed fields to `async-graphql` dynamic fields.
//!
//! Every field's resolve function is wrapped so that it receives
//! [`ResolveParams`] built from the engine's resolver context, and its result
//! is shaped for the engine: enum internal values are mapped back to enum
//! names and values of interface or union type are tagged with a concrete
//! object type.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_graphql::dynamic::{
    self, FieldFuture, FieldValue, ResolverContext, SubscriptionFieldFuture,
};
use async_graphql::{Name, Value};
use futures_util::stream::{self, BoxStream, StreamExt};
use indexmap::IndexMap;

use crate::Result;
use crate::composers::{ArgumentConfig, FieldConfig, IsTypeOfFn, NamedTypeComposer, ResolveTypeFn};
use crate::resolver::{
    Projection, RequestContext, ResolveFn, ResolveInfo, ResolveParams, SubscribeFn,
};
use crate::type_ref::TypeReference;
use crate::value;

/// How a value of an interface or union type finds its object type.
#[derive(Clone)]
pub struct AbstractShape {
    pub resolve_type: Option<ResolveTypeFn>,
    pub candidates: Vec<(String, IsTypeOfFn)>,
}

impl AbstractShape {
    /// `resolve_type`, then the type resolvers in insertion order, then a
    /// `__typename` key on the value.
    pub fn pick(&self, value: &Value) -> Option<String> {
        if let Some(resolve_type) = &self.resolve_type
            && let Some(name) = resolve_type(value)
        {
            return Some(name);
        }
        if let Some((name, _)) = self.candidates.iter().find(|(_, check)| check(value)) {
            return Some(name.clone());
        }
        match value::get_key(value, "__typename") {
            Some(Value::String(name)) => Some(name.clone()),
            Some(Value::Enum(name)) => Some(name.to_string()),
            _ => None,
        }
    }
}

/// Returns the first type in `dead` that the field's type or arguments refer to.
pub(crate) fn dead_reference(config: &FieldConfig, dead: &HashSet<String>) -> Result<Option<String>> {
    if dead.is_empty() {
        return Ok(None);
    }
    let target = config.type_.get_type_name()?;
    if dead.contains(&target) {
        return Ok(Some(target));
    }
    for arg in config.args.values() {
        let arg_type = arg.type_.get_type_name()?;
        if dead.contains(&arg_type) {
            return Ok(Some(arg_type));
        }
    }
    Ok(None)
}

#[derive(Clone)]
enum OutputShape {
    Leaf,
    Enum(Arc<Vec<(Value, Name)>>),
    Abstract(String, Arc<AbstractShape>),
    List(Box<OutputShape>),
}

impl OutputShape {
    fn of(type_: &TypeReference) -> Result<Self> {
        Ok(match type_ {
            TypeReference::Named(tc) => match tc {
                NamedTypeComposer::Enum(etc) => Self::Enum(Arc::new(
                    etc.internal_values()
                        .into_iter()
                        .map(|(name, internal)| (internal, Name::new(name)))
                        .collect(),
                )),
                NamedTypeComposer::Interface(iftc) => {
                    Self::Abstract(iftc.get_type_name(), Arc::new(iftc.abstract_shape()))
                }
                NamedTypeComposer::Union(utc) => {
                    Self::Abstract(utc.get_type_name(), Arc::new(utc.abstract_shape()))
                }
                _ => Self::Leaf,
            },
            TypeReference::List(inner) => Self::List(Box::new(Self::of(inner)?)),
            TypeReference::NonNull(inner) => Self::of(inner)?,
            TypeReference::Thunk(thunk) => Self::of(&thunk.force()?)?,
        })
    }

    fn to_field_value<'a>(&self, value: Value) -> async_graphql::Result<FieldValue<'a>> {
        match (self, value) {
            (_, Value::Null) => Ok(FieldValue::NULL),
            (Self::List(inner), Value::List(items)) => {
                let items = items
                    .into_iter()
                    .map(|item| inner.to_field_value(item))
                    .collect::<async_graphql::Result<Vec<_>>>()?;
                Ok(FieldValue::list(items))
            }
            (Self::Enum(values), value) => Ok(FieldValue::value(enum_name(values, value))),
            (Self::Abstract(type_name, shape), value) => match shape.pick(&value) {
                Some(object_type) => Ok(FieldValue::value(value).with_type(object_type)),
                None => Err(async_graphql::Error::new(format!(
                    "Abstract type `{type_name}` must resolve to an object type at runtime"
                ))),
            },
            (_, value) => Ok(FieldValue::value(value)),
        }
    }

    fn to_value(&self, value: Value) -> Value {
        match (self, value) {
            (Self::List(inner), Value::List(items)) => {
                Value::List(items.into_iter().map(|item| inner.to_value(item)).collect())
            }
            (Self::Enum(values), value) => enum_name(values, value),
            (_, value) => value,
        }
    }
}

fn enum_name(values: &[(Value, Name)], value: Value) -> Value {
    if let Some((_, name)) = values.iter().find(|(internal, _)| *internal == value) {
        return Value::Enum(name.clone());
    }
    match value {
        Value::String(text) if values.iter().any(|(_, name)| name.as_str() == text) => {
            Value::Enum(Name::new(text))
        }
        other => other,
    }
}

#[derive(Clone)]
enum InputShape {
    Named(String),
    List(Box<InputShape>),
}

enum InputKind {
    Enum(HashMap<String, Value>),
    Object(Vec<(String, InputShape)>),
}

/// Maps enum names in incoming arguments to internal values, through lists
/// and input objects.
struct InputShapes {
    args: HashMap<String, InputShape>,
    kinds: HashMap<String, InputKind>,
}

impl InputShapes {
    fn of_args(args: &IndexMap<String, ArgumentConfig>) -> Result<Self> {
        let mut kinds = HashMap::new();
        let mut shapes = HashMap::with_capacity(args.len());
        for (name, arg) in args {
            shapes.insert(name.clone(), collect_input(&arg.type_, &mut kinds)?);
        }
        Ok(Self { args: shapes, kinds })
    }

    fn arg(&self, name: &str, value: Value) -> Value {
        match self.args.get(name) {
            Some(shape) => self.internalize(shape, value),
            None => value,
        }
    }

    fn internalize(&self, shape: &InputShape, value: Value) -> Value {
        match (shape, value) {
            (_, Value::Null) => Value::Null,
            (InputShape::List(inner), Value::List(items)) => Value::List(
                items
                    .into_iter()
                    .map(|item| self.internalize(inner, item))
                    .collect(),
            ),
            (InputShape::List(inner), value) => self.internalize(inner, value),
            (InputShape::Named(type_name), value) => match (self.kinds.get(type_name), value) {
                (Some(InputKind::Enum(values)), Value::Enum(name)) => values
                    .get(name.as_str())
                    .cloned()
                    .unwrap_or(Value::Enum(name)),
                (Some(InputKind::Enum(values)), Value::String(name)) => {
                    values.get(&name).cloned().unwrap_or(Value::String(name))
                }
                (Some(InputKind::Object(fields)), Value::Object(object)) => Value::Object(
                    object
                        .into_iter()
                        .map(|(key, item)| {
                            match fields.iter().find(|(field, _)| field.as_str() == key.as_str()) {
                                Some((_, field_shape)) => {
                                    let item = self.internalize(field_shape, item);
                                    (key, item)
                                }
                                None => (key, item),
                            }
                        })
                        .collect(),
                ),
                (_, value) => value,
            },
        }
    }
}

fn collect_input(type_: &TypeReference, kinds: &mut HashMap<String, InputKind>) -> Result<InputShape> {
    match type_ {
        TypeReference::Named(tc) => {
            let name = tc.get_type_name();
            if !kinds.contains_key(&name) {
                match tc {
                    NamedTypeComposer::Enum(etc) => {
                        kinds.insert(name.clone(), InputKind::Enum(etc.internal_values().into_iter().collect()));
                    }
                    NamedTypeComposer::Input(itc) => {
                        // Placeholder stops recursion on self-referencing inputs.
                        kinds.insert(name.clone(), InputKind::Object(Vec::new()));
                        let mut fields = Vec::new();
                        for (field_name, field) in itc.get_fields()? {
                            fields.push((field_name, collect_input(&field.type_, kinds)?));
                        }
                        kinds.insert(name.clone(), InputKind::Object(fields));
                    }
                    _ => {}
                }
            }
            Ok(InputShape::Named(name))
        }
        TypeReference::List(inner) => Ok(InputShape::List(Box::new(collect_input(inner, kinds)?))),
        TypeReference::NonNull(inner) => collect_input(inner, kinds),
        TypeReference::Thunk(thunk) => collect_input(&thunk.force()?, kinds),
    }
}

fn resolve_params(
    ctx: &ResolverContext<'_>,
    inputs: &InputShapes,
    info: &ResolveInfo,
    projection: Option<&Projection>,
) -> ResolveParams {
    let source = ctx.parent_value.as_value().cloned().unwrap_or(Value::Null);
    let args = ctx
        .args
        .iter()
        .map(|(name, accessor)| {
            let name = name.to_string();
            let value = inputs.arg(&name, accessor.as_value().clone());
            (name, value)
        })
        .collect();

    let mut requested = Projection::from_selection(&ctx.ctx.field());
    if let Some(projection) = projection {
        requested.merge(projection);
    }

    ResolveParams {
        source,
        args,
        context: ctx.ctx.data_opt::<RequestContext>().map(|c| c.0.clone()),
        info: info.clone(),
        projection: requested,
        raw_query: None,
    }
}

struct FieldRuntime {
    output: OutputShape,
    inputs: InputShapes,
    info: ResolveInfo,
    projection: Option<Projection>,
    resolve: Option<ResolveFn>,
    subscribe: Option<SubscribeFn>,
}

impl FieldRuntime {
    fn new(parent: &str, name: &str, config: &FieldConfig) -> Result<Self> {
        Ok(Self {
            output: OutputShape::of(&config.type_)?,
            inputs: InputShapes::of_args(&config.args)?,
            info: ResolveInfo {
                field_name: name.to_string(),
                parent_type: parent.to_string(),
                return_type: config.type_.type_string()?,
            },
            projection: config.projection.clone(),
            resolve: config.resolve.clone(),
            subscribe: config.subscribe.clone(),
        })
    }

    fn params(&self, ctx: &ResolverContext<'_>) -> ResolveParams {
        resolve_params(ctx, &self.inputs, &self.info, self.projection.as_ref())
    }
}

/// Builds the engine field for an object field.
///
/// Without a resolve function the field reads `source[name]`.
pub(crate) fn build_output_field(parent: &str, name: &str, config: &FieldConfig) -> Result<dynamic::Field> {
    let runtime = Arc::new(FieldRuntime::new(parent, name, config)?);

    let mut field = dynamic::Field::new(name, config.type_.get_type()?, move |ctx| {
        let rp = runtime.params(&ctx);
        let runtime = runtime.clone();
        FieldFuture::new(async move {
            let value = match &runtime.resolve {
                Some(resolve) => resolve(rp).await?,
                None => value::get_key(&rp.source, &runtime.info.field_name).cloned(),
            };
            match value {
                None | Some(Value::Null) => Ok(None),
                Some(value) => runtime.output.to_field_value(value).map(Some),
            }
        })
    });

    if let Some(description) = &config.description {
        field = field.description(description.as_str());
    }
    if let Some(reason) = &config.deprecation_reason {
        field = field.deprecation(Some(reason.as_str()));
    }
    for (arg_name, arg) in &config.args {
        field = field.argument(build_input_value(arg_name, arg)?);
    }
    Ok(field)
}

async fn resolve_event(resolve: Option<ResolveFn>, rp: ResolveParams) -> async_graphql::Result<Value> {
    match resolve {
        Some(resolve) => Ok(resolve(rp).await?.unwrap_or(Value::Null)),
        None => Ok(rp.source),
    }
}

async fn event_stream(
    runtime: Arc<FieldRuntime>,
    rp: ResolveParams,
) -> async_graphql::Result<BoxStream<'static, async_graphql::Result<Value>>> {
    let events = match &runtime.subscribe {
        Some(subscribe) => {
            let payloads = subscribe(rp.clone()).await?;
            let runtime = runtime.clone();
            payloads
                .then(move |payload| {
                    let resolve = runtime.resolve.clone();
                    let mut rp = rp.clone();
                    async move {
                        rp.source = payload?;
                        resolve_event(resolve, rp).await
                    }
                })
                .boxed()
        }
        None => stream::once(resolve_event(runtime.resolve.clone(), rp)).boxed(),
    };
    Ok(events
        .map(move |event| event.map(|value| runtime.output.to_value(value)))
        .boxed())
}

/// Builds the engine field for a subscription root field.
///
/// Each payload of the `subscribe` stream becomes the `source` of `resolve`.
/// Without `subscribe` the field emits one event produced by `resolve`.
pub(crate) fn build_subscription_field(
    parent: &str,
    name: &str,
    config: &FieldConfig,
) -> Result<dynamic::SubscriptionField> {
    let runtime = Arc::new(FieldRuntime::new(parent, name, config)?);

    let mut field = dynamic::SubscriptionField::new(name, config.type_.get_type()?, move |ctx| {
        let rp = runtime.params(&ctx);
        SubscriptionFieldFuture::new(event_stream(runtime.clone(), rp))
    });

    if let Some(description) = &config.description {
        field = field.description(description.as_str());
    }
    if let Some(reason) = &config.deprecation_reason {
        field = field.deprecation(Some(reason.as_str()));
    }
    for (arg_name, arg) in &config.args {
        field = field.argument(build_input_value(arg_name, arg)?);
    }
    Ok(field)
}

pub(crate) fn build_interface_field(name: &str, config: &FieldConfig) -> Result<dynamic::InterfaceField> {
    let mut field = dynamic::InterfaceField::new(name, config.type_.get_type()?);
    if let Some(description) = &config.description {
        field = field.description(description.as_str());
    }
    if let Some(reason) = &config.deprecation_reason {
        field = field.deprecation(Some(reason.as_str()));
    }
    for (arg_name, arg) in &config.args {
        field = field.argument(build_input_value(arg_name, arg)?);
    }
    Ok(field)
}

/// Builds an argument or input field.
pub(crate) fn build_input_value(name: &str, config: &ArgumentConfig) -> Result<dynamic::InputValue> {
    let mut input = dynamic::InputValue::new(name, config.type_.get_type()?);
    if let Some(description) = &config.description {
        input = input.description(description.as_str());
    }
    if let Some(default) = &config.default_value {
        input = input.default_value(default.clone());
    }
    Ok(input)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::SchemaComposer;
    use crate::value::json_to_graphql_value;

    #[test]
    fn test_abstract_pick_order() {
        let shape = AbstractShape {
            resolve_type: Some(Arc::new(|v: &Value| {
                value::get_key(v, "meow").map(|_| "Cat".to_string())
            })),
            candidates: vec![
                ("Dog".to_string(), Arc::new(|v: &Value| value::get_key(v, "bark").is_some())),
                ("Any".to_string(), Arc::new(|_: &Value| true)),
            ],
        };
        assert_eq!(shape.pick(&json_to_graphql_value(json!({ "meow": 1 }))).as_deref(), Some("Cat"));
        assert_eq!(shape.pick(&json_to_graphql_value(json!({ "bark": 1 }))).as_deref(), Some("Dog"));
        assert_eq!(shape.pick(&json_to_graphql_value(json!({}))).as_deref(), Some("Any"));

        let fallback = AbstractShape {
            resolve_type: None,
            candidates: Vec::new(),
        };
        assert_eq!(
            fallback
                .pick(&json_to_graphql_value(json!({ "__typename": "Fish" })))
                .as_deref(),
            Some("Fish")
        );
        assert_eq!(fallback.pick(&Value::Null), None);
    }

    #[test]
    fn test_enum_values_mapped_both_ways() {
        let sc = SchemaComposer::new();
        sc.add_type_defs(
            r#"
            enum Status { ACTIVE INACTIVE }
            input Filter { status: Status tags: [Status] }
            "#,
        )
        .unwrap();
        let status = sc.get_etc("Status").unwrap();
        status
            .extend_field("ACTIVE", crate::composers::EnumValueConfig::new().value(Value::Number(1.into())))
            .unwrap();

        let filter = TypeReference::Named(sc.get("Filter").unwrap());
        let mut args = IndexMap::new();
        args.insert("filter".to_string(), ArgumentConfig::new(filter));
        let inputs = InputShapes::of_args(&args).unwrap();

        let incoming = Value::Object(
            [
                (Name::new("status"), Value::Enum(Name::new("ACTIVE"))),
                (
                    Name::new("tags"),
                    Value::List(vec![
                        Value::Enum(Name::new("INACTIVE")),
                        Value::Enum(Name::new("ACTIVE")),
                    ]),
                ),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(
            inputs.arg("filter", incoming),
            json_to_graphql_value(json!({ "status": 1, "tags": ["INACTIVE", 1] }))
        );

        let output = OutputShape::of(&TypeReference::list(TypeReference::Named(sc.get("Status").unwrap())))
            .unwrap();
        assert_eq!(
            output.to_value(json_to_graphql_value(json!([1, "INACTIVE", "OTHER"]))),
            Value::List(vec![
                Value::Enum(Name::new("ACTIVE")),
                Value::Enum(Name::new("INACTIVE")),
                Value::String("OTHER".into()),
            ])
        );
    }

    #[test]
    fn test_self_referencing_input_terminates() {
        let sc = SchemaComposer::new();
        sc.add_type_defs("input Node { next: Node value: Int }").unwrap();
        let mut args = IndexMap::new();
        args.insert(
            "node".to_string(),
            ArgumentConfig::new(TypeReference::Named(sc.get("Node").unwrap())),
        );
        let inputs = InputShapes::of_args(&args).unwrap();
        let value = json_to_graphql_value(json!({ "next": { "value": 2 }, "value": 1 }));
        assert_eq!(inputs.arg("node", value.clone()), value);
    }

    #[test]
    fn test_dead_reference_checks_args() {
        let sc = SchemaComposer::new();
        sc.add_type_defs("type Empty { a: Int } input Ghost { a: Int } type Query { a(g: Ghost): Int }")
            .unwrap();
        let field = sc.get_otc("Query").unwrap().get_field("a").unwrap();

        let dead: HashSet<String> = ["Ghost".to_string()].into_iter().collect();
        assert_eq!(dead_reference(&field, &dead).unwrap().as_deref(), Some("Ghost"));
        assert_eq!(dead_reference(&field, &HashSet::new()).unwrap(), None);
    }
}
