//! Integration tests for composing and building type graphs.

use async_graphql::Value;
use serde_json::json;
use typegraph_compose::mapper::FieldDefinition;
use typegraph_compose::value::json_to_graphql_value;
use typegraph_compose::{
    BuildOptions, ComposerConfig, ResolveParams, ResolverDefinition, SchemaComposer, TypeReference,
    resolve_fn,
};

fn sdl_of(sc: &SchemaComposer) -> String {
    sc.build_schema(&BuildOptions::default()).unwrap().sdl()
}

#[test]
fn test_mutation_after_read_reaches_schema() {
    let sc = SchemaComposer::new();
    sc.add_type_defs("type User { id: ID name: String } type Query { me: User }")
        .unwrap();
    let user = sc.get_otc("User").unwrap();

    assert!(sdl_of(&sc).contains("name: String"));

    user.set_fields([("id", "ID"), ("email", "String")]).unwrap();
    let sdl = sdl_of(&sc);
    assert!(sdl.contains("email: String"));
    assert!(!sdl.contains("name: String"));
}

#[test]
fn test_circular_types_build() {
    let sc = SchemaComposer::new();
    sc.add_type_defs(
        r#"
        type Author { name: String posts: [Post] }
        type Post { title: String author: Author }
        type Query { posts: [Post] }
        "#,
    )
    .unwrap();

    let post = sc.get_otc("Post").unwrap();
    let author = sc.get_otc("Author").unwrap();
    assert!(post.get_field_tc("author").unwrap().ptr_eq(&author.clone().into()));

    let sdl = sdl_of(&sc);
    assert!(sdl.contains("type Author"));
    assert!(sdl.contains("posts: [Post]"));
}

#[test]
fn test_deferred_reference_to_later_type() {
    let sc = SchemaComposer::new();
    let registry = sc.clone();
    sc.query()
        .unwrap()
        .set_field(
            "later",
            FieldDefinition::new(TypeReference::thunk(
                move || Ok(TypeReference::Named(registry.get("Later")?)),
                Some("Later".to_string()),
            )),
        )
        .unwrap();
    sc.create_object_tc("type Later { ok: Boolean }").unwrap();

    assert!(sdl_of(&sc).contains("later: Later"));
    sc.clear();
}

#[test]
fn test_input_type_derived_from_object() {
    let sc = SchemaComposer::new();
    sc.add_type_defs(
        r#"
        type Person { name: String! friends: [Person] }
        type Query { ok: Boolean }
        "#,
    )
    .unwrap();
    let person = sc.get_otc("Person").unwrap();
    let input = person.get_input_type_composer().unwrap();
    assert_eq!(input.get_type_name(), "PersonInput");
    assert_eq!(input.get_field_type_name("friends").unwrap(), "PersonInput");
    assert_eq!(
        input.get_field_type("name").unwrap().type_string().unwrap(),
        "String!"
    );

    sc.query()
        .unwrap()
        .set_field(
            "echo",
            FieldDefinition::new("Person").arg("person", input.get_type_non_null()),
        )
        .unwrap();
    let sdl = sdl_of(&sc);
    assert!(sdl.contains("input PersonInput"));
    assert!(sdl.contains("echo(person: PersonInput!): Person"));
}

#[test]
fn test_clone_registered_under_new_name() {
    let sc = SchemaComposer::new();
    sc.add_type_defs("type User { id: ID name: String } type Query { user: User }")
        .unwrap();
    let user = sc.get_otc("User").unwrap();
    let admin = user.clone_as("Admin").unwrap();
    admin.set_field("role", "String").unwrap();
    sc.add(admin.clone()).unwrap();
    sc.query().unwrap().set_field("admin", FieldDefinition::from(admin)).unwrap();

    assert!(!user.has_field("role"));
    let sdl = sdl_of(&sc);
    assert!(sdl.contains("type Admin"));
    assert!(sdl.contains("role: String"));
}

#[test]
fn test_config_from_toml_drives_build() {
    let config = ComposerConfig::from_toml_str("keep_unused_types = true\nprune_empty_types = false").unwrap();
    let sc = SchemaComposer::with_config(config);
    sc.add_type_defs("type Query { ok: Boolean } type Orphan { id: ID } type Empty { self: Empty }")
        .unwrap();

    let config = sc.build_schema_config(&sc.build_options()).unwrap();
    assert!(config.type_names.contains(&"Orphan".to_string()));
    assert!(config.type_names.contains(&"Empty".to_string()));
    assert!(config.pruned.is_empty());
}

#[test]
fn test_must_have_types_emitted() {
    let sc = SchemaComposer::new();
    sc.add_type_defs("type Query { ok: Boolean } enum Color { RED GREEN }").unwrap();
    assert!(!sdl_of(&sc).contains("enum Color"));

    let color = sc.get_etc("Color").unwrap();
    sc.add_schema_must_have_type(color);
    assert!(sdl_of(&sc).contains("enum Color"));
}

#[tokio::test]
async fn test_wrapped_resolver_leaves_original_alone() {
    let sc = SchemaComposer::new();
    let count = sc
        .create_resolver(
            ResolverDefinition::new("count")
                .type_("Int")
                .resolve(resolve_fn(|_| async { Ok(Some(Value::Number(1.into()))) })),
        )
        .unwrap();
    let doubled = count
        .wrap_resolve(|next| {
            resolve_fn(move |rp: ResolveParams| {
                let next = next.clone();
                async move {
                    let n = match next(rp).await? {
                        Some(Value::Number(n)) => n.as_i64().unwrap_or_default(),
                        _ => 0,
                    };
                    Ok(Some(Value::Number((n * 2).into())))
                }
            })
        })
        .unwrap();
    assert_eq!(doubled.get_nested_name(), "wrapResolve(count)");

    let query = sc.query().unwrap();
    query.set_field("count", count).unwrap();
    query.set_field("doubled", doubled).unwrap();

    let schema = sc.build().unwrap();
    let data = schema.execute("{ count doubled }").await.data.into_json().unwrap();
    assert_eq!(data, json!({ "count": 1, "doubled": 2 }));
}

#[tokio::test]
async fn test_interface_resolve_type() {
    let sc = SchemaComposer::new();
    sc.add_type_defs(
        r#"
        interface Node { id: ID! }
        type User implements Node { id: ID! name: String }
        type Group implements Node { id: ID! size: Int }
        "#,
    )
    .unwrap();
    let node = sc.get_iftc("Node").unwrap();
    node.set_resolve_type(std::sync::Arc::new(|value: &Value| {
        let is_group = typegraph_compose::value::get_key(value, "size").is_some();
        Some(if is_group { "Group" } else { "User" }.to_string())
    }));

    sc.query()
        .unwrap()
        .set_field(
            "nodes",
            FieldDefinition::new("[Node!]!").resolve(resolve_fn(|_| async {
                Ok(Some(json_to_graphql_value(json!([
                    { "id": "u1", "name": "Ann" },
                    { "id": "g1", "size": 3 }
                ]))))
            })),
        )
        .unwrap();

    let schema = sc.build().unwrap();
    let response = schema
        .execute("{ nodes { id ... on User { name } ... on Group { size } } }")
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "nodes": [{ "id": "u1", "name": "Ann" }, { "id": "g1", "size": 3 }] })
    );
}
