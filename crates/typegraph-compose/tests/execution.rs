//! Integration tests executing built schemas.
//!
//! These tests compose type graphs, build them into `async-graphql` dynamic
//! schemas and run real requests against them.

use std::sync::{Arc, Mutex};

use async_graphql::{Request, Value};
use futures_util::StreamExt;
use futures_util::stream;
use serde_json::json;
use typegraph_compose::composers::{PrepareArg, RelationOptions};
use typegraph_compose::mapper::FieldDefinition;
use typegraph_compose::resolver::{
    FilterArgOptions, RequestContext, middleware, subscribe_fn,
};
use typegraph_compose::value::{get_key, json_to_graphql_value};
use typegraph_compose::{
    BuildOptions, EnumValueConfig, ResolveParams, ResolverDefinition, SchemaComposer, resolve_fn,
};

// =============================================================================
// Helpers
// =============================================================================

async fn run(sc: &SchemaComposer, request: impl Into<Request>) -> serde_json::Value {
    let schema = sc.build_schema(&BuildOptions::default()).unwrap();
    let response = schema.execute(request).await;
    assert!(response.errors.is_empty(), "unexpected errors: {:?}", response.errors);
    response.data.into_json().unwrap()
}

fn constant(value: serde_json::Value) -> typegraph_compose::resolver::ResolveFn {
    let value = json_to_graphql_value(value);
    resolve_fn(move |_| {
        let value = value.clone();
        async move { Ok(Some(value)) }
    })
}

// =============================================================================
// Field resolution
// =============================================================================

#[tokio::test]
async fn test_fields_read_source_keys() {
    let sc = SchemaComposer::new();
    sc.add_type_defs("type User { id: ID! name: String }").unwrap();
    sc.query()
        .unwrap()
        .set_field(
            "me",
            FieldDefinition::new("User").resolve(constant(json!({ "id": "1", "name": "Ann" }))),
        )
        .unwrap();

    let data = run(&sc, "{ me { id name } }").await;
    assert_eq!(data, json!({ "me": { "id": "1", "name": "Ann" } }));
}

#[tokio::test]
async fn test_enum_internal_values() {
    let sc = SchemaComposer::new();
    sc.add_type_defs("enum Status { ACTIVE INACTIVE }").unwrap();
    sc.get_etc("Status")
        .unwrap()
        .extend_field("ACTIVE", EnumValueConfig::new().value(Value::Number(1.into())))
        .unwrap();

    let seen = Arc::new(Mutex::new(None));
    let captured = seen.clone();
    sc.query()
        .unwrap()
        .set_field(
            "echo",
            FieldDefinition::new("Status")
                .arg("status", "Status")
                .resolve(resolve_fn(move |rp: ResolveParams| {
                    let captured = captured.clone();
                    async move {
                        let status = rp.arg("status").cloned();
                        *captured.lock().unwrap() = status.clone();
                        Ok(status)
                    }
                })),
        )
        .unwrap();

    let data = run(&sc, "{ echo(status: ACTIVE) }").await;
    assert_eq!(data, json!({ "echo": "ACTIVE" }));
    assert_eq!(*seen.lock().unwrap(), Some(Value::Number(1.into())));
}

#[tokio::test]
async fn test_union_members_picked_at_runtime() {
    let sc = SchemaComposer::new();
    sc.add_type_defs(
        r#"
        type Cat { meow: String }
        type Dog { bark: String }
        union Pet = Cat | Dog
        "#,
    )
    .unwrap();
    let dog = sc.get_otc("Dog").unwrap();
    sc.get_utc("Pet")
        .unwrap()
        .add_type_resolver(&dog, |value| get_key(value, "bark").is_some());

    sc.query()
        .unwrap()
        .set_field(
            "pets",
            FieldDefinition::new("[Pet]").resolve(constant(json!([
                { "__typename": "Cat", "meow": "mrr" },
                { "bark": "woof" }
            ]))),
        )
        .unwrap();

    let data = run(&sc, "{ pets { ... on Cat { meow } ... on Dog { bark } } }").await;
    assert_eq!(data, json!({ "pets": [{ "meow": "mrr" }, { "bark": "woof" }] }));
}

#[tokio::test]
async fn test_request_context_and_projection() {
    let sc = SchemaComposer::new();
    sc.add_type_defs("type User { id: ID name: String email: String }").unwrap();

    let requested = Arc::new(Mutex::new(Vec::new()));
    let captured = requested.clone();
    sc.query()
        .unwrap()
        .set_field(
            "me",
            FieldDefinition::new("User").resolve(resolve_fn(move |rp: ResolveParams| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = rp.projection.names().cloned().collect::<Vec<_>>();
                    let name = rp.context_as::<String>().cloned().unwrap_or_default();
                    Ok(Some(json_to_graphql_value(json!({ "id": "7", "name": name }))))
                }
            })),
        )
        .unwrap();

    let request = Request::new("{ me { id name } }").data(RequestContext(Arc::new("alice".to_string())));
    let data = run(&sc, request).await;
    assert_eq!(data, json!({ "me": { "id": "7", "name": "alice" } }));
    assert_eq!(*requested.lock().unwrap(), vec!["id".to_string(), "name".to_string()]);
}

// =============================================================================
// Resolvers
// =============================================================================

#[tokio::test]
async fn test_filter_arg_and_middleware() {
    let sc = SchemaComposer::new();
    let find = sc
        .create_resolver(ResolverDefinition::new("find").type_("JSON").resolve(resolve_fn(
            |rp: ResolveParams| async move {
                let raw = rp.raw_query.unwrap_or_default();
                Ok(Some(Value::Object(
                    raw.into_iter()
                        .map(|(key, value)| (async_graphql::Name::new(key), value))
                        .collect(),
                )))
            },
        )))
        .unwrap();

    let filtered = find
        .add_filter_arg(
            FilterArgOptions::new("age", "Int")
                .fallback_type_name("FindFilter")
                .query(|raw, value, _| {
                    raw.insert("age".to_string(), value.clone());
                }),
        )
        .unwrap()
        .with_middlewares(vec![middleware(|next, rp: ResolveParams| async move {
            let result = next(rp).await?;
            Ok(result.map(|mut value| {
                typegraph_compose::value::set_key(&mut value, "checked", Value::Boolean(true));
                value
            }))
        })])
        .unwrap();
    sc.query().unwrap().set_field("find", filtered).unwrap();

    let data = run(&sc, "{ find(filter: { age: 30 }) }").await;
    assert_eq!(data, json!({ "find": { "age": 30, "checked": true } }));
}

#[tokio::test]
async fn test_relation_prepares_args_and_catches_errors() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let sc = SchemaComposer::new();
    sc.add_type_defs(
        r#"
        type User { id: ID! name: String }
        type Post { title: String authorId: ID }
        "#,
    )
    .unwrap();

    let find_user = sc
        .create_resolver(
            ResolverDefinition::new("findUser")
                .type_("User")
                .arg("id", "ID!")
                .resolve(resolve_fn(|rp: ResolveParams| async move {
                    let id = rp.arg("id").cloned().unwrap_or(Value::Null);
                    Ok(Some(json_to_graphql_value(json!({ "id": id.into_json()?, "name": "Ann" }))))
                })),
        )
        .unwrap();
    let broken = sc
        .create_resolver(
            ResolverDefinition::new("broken")
                .type_("User")
                .resolve(resolve_fn(|_| async { Err(async_graphql::Error::new("boom")) })),
        )
        .unwrap();

    let post = sc.get_otc("Post").unwrap();
    post.add_relation(
        "author",
        RelationOptions::resolver(find_user).prepare_arg(
            "id",
            PrepareArg::compute(|rp| get_key(&rp.source, "authorId").cloned().unwrap_or(Value::Null)),
        ),
    )
    .unwrap();
    post.add_relation("editor", RelationOptions::resolver(broken)).unwrap();
    assert!(!post.get_field_args("author").unwrap().contains_key("id"));

    sc.query()
        .unwrap()
        .set_field(
            "posts",
            FieldDefinition::new("[Post]").resolve(constant(json!([{ "title": "Hello", "authorId": "u1" }]))),
        )
        .unwrap();

    let data = run(&sc, "{ posts { title author { id name } editor { name } } }").await;
    assert_eq!(
        data,
        json!({
            "posts": [{
                "title": "Hello",
                "author": { "id": "u1", "name": "Ann" },
                "editor": null
            }]
        })
    );
}

// =============================================================================
// Subscriptions
// =============================================================================

#[tokio::test]
async fn test_subscription_payloads_pass_through_resolve() {
    let sc = SchemaComposer::new();
    sc.query()
        .unwrap()
        .set_field("ok", FieldDefinition::new("Boolean").resolve(constant(json!(true))))
        .unwrap();
    sc.subscription()
        .unwrap()
        .set_field(
            "ticks",
            FieldDefinition::new("Int")
                .subscribe(subscribe_fn(|_| async {
                    let payloads: Vec<async_graphql::Result<Value>> =
                        (1..=3).map(|n| Ok(Value::Number(n.into()))).collect();
                    Ok(stream::iter(payloads).boxed())
                }))
                .resolve(resolve_fn(|rp: ResolveParams| async move {
                    let n = match rp.source {
                        Value::Number(n) => n.as_i64().unwrap_or_default(),
                        _ => 0,
                    };
                    Ok(Some(Value::Number((n * 2).into())))
                })),
        )
        .unwrap();

    let schema = sc.build().unwrap();
    let responses: Vec<_> = schema.execute_stream("subscription { ticks }").collect().await;
    let ticks: Vec<serde_json::Value> = responses
        .into_iter()
        .map(|response| response.data.into_json().unwrap()["ticks"].clone())
        .collect();
    assert_eq!(ticks, vec![json!(2), json!(4), json!(6)]);
}

// =============================================================================
// Build options
// =============================================================================

#[tokio::test]
async fn test_introspection_switch() {
    let sc = SchemaComposer::new();
    sc.query()
        .unwrap()
        .set_field("ok", FieldDefinition::new("Boolean").resolve(constant(json!(true))))
        .unwrap();

    let data = run(&sc, "{ __schema { queryType { name } } }").await;
    assert_eq!(data, json!({ "__schema": { "queryType": { "name": "Query" } } }));

    let opts = BuildOptions {
        introspection: false,
        ..BuildOptions::default()
    };
    let schema = sc.build_schema(&opts).unwrap();
    let response = schema.execute("{ __schema { queryType { name } } }").await;
    assert!(!response.errors.is_empty());
}

#[tokio::test]
async fn test_depth_limit() {
    let sc = SchemaComposer::new();
    sc.add_type_defs("type Node { id: ID child: Node }").unwrap();
    sc.query()
        .unwrap()
        .set_field("root", FieldDefinition::new("Node").resolve(constant(json!({ "id": "1" }))))
        .unwrap();

    let opts = BuildOptions {
        max_depth: Some(2),
        ..BuildOptions::default()
    };
    let schema = sc.build_schema(&opts).unwrap();
    let response = schema.execute("{ root { child { child { id } } } }").await;
    assert!(!response.errors.is_empty());

    let response = schema.execute("{ root { id } }").await;
    assert!(response.errors.is_empty());
}
