use std::convert::Infallible;

use futures::StreamExt;
use structql::{
    Ctx, Id, PageArguments, Reflect, ReflectEnum, RequestMetadata, Resolvers, ResolverMap,
    SchemaBuilder, SchemaError,
};

#[derive(Debug, Clone, Default, Reflect)]
struct User {
    pub id: Id,
    #[graphql("alias=emailAddress")]
    pub email: String,
    secret: String,
}

#[derive(Debug, Clone, Default, Reflect)]
struct Item {
    pub id: Id,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, ReflectEnum)]
enum Status {
    Active,
    InProgress,
}

#[derive(Default, Reflect)]
#[graphql(resolvers)]
struct Query {
    pub hello: String,
    pub user: Option<User>,
    pub status: Option<Status>,
    pub who: Option<String>,
    #[relay]
    pub items: Vec<Item>,
}

impl Resolvers for Query {
    fn resolvers(map: &mut ResolverMap<Self>) {
        map.field("hello", |_: &Query, _| Ok::<_, Infallible>("world"));
        map.field("user", |_: &Query, _| {
            Ok::<_, Infallible>(Some(User {
                id: "1".into(),
                email: "ada@example.com".into(),
                secret: "hunter2".into(),
            }))
        });
        map.field("status", |_: &Query, _| {
            Ok::<_, Infallible>(Some(Status::Active))
        });
        map.field("who", |_: &Query, ctx: &Ctx| {
            Ok::<_, Infallible>(Some(ctx.header("x-user").unwrap_or("anon").to_string()))
        });
        map.paginated("items", |_: &Query, _: &Ctx, _: &PageArguments| {
            Ok::<_, Infallible>(
                (1..=5)
                    .map(|i| Item {
                        id: Id::from(i as i64),
                        label: format!("item {i}"),
                    })
                    .collect(),
            )
        });
    }
}

#[derive(Debug, Clone, Default, Reflect)]
struct CreateUserArgs {
    #[graphql("required")]
    pub email: String,
    #[graphql("required")]
    pub password: String,
}

#[derive(Default, Reflect)]
#[graphql(resolvers)]
struct Mutation {
    pub create_user: Option<User>,
}

impl Resolvers for Mutation {
    fn resolvers(map: &mut ResolverMap<Self>) {
        map.field_with("create_user", |_: &Mutation, _: &Ctx, args: CreateUserArgs| {
            Ok::<_, Infallible>(Some(User {
                id: "1".into(),
                email: args.email,
                secret: String::new(),
            }))
        });
    }
}

#[derive(Default, Reflect)]
#[graphql(resolvers)]
struct Subscription {
    pub ticks: i64,
}

impl Resolvers for Subscription {
    fn resolvers(map: &mut ResolverMap<Self>) {
        map.stream("ticks", |_: &Subscription, _: &Ctx| {
            futures::stream::iter((0..3i64).map(Ok::<i64, anyhow::Error>))
        });
    }
}

fn schema() -> structql::BuiltSchema {
    SchemaBuilder::new()
        .enum_type::<Status>()
        .query::<Query>()
        .mutation::<Mutation>()
        .subscription::<Subscription>()
        .finish()
        .expect("schema builds")
}

#[tokio::test]
async fn resolves_nested_objects() {
    let response = schema()
        .execute_query("{ hello user { id emailAddress } }")
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json().unwrap();
    assert_eq!(data["hello"], "world");
    assert_eq!(data["user"]["id"], "1");
    assert_eq!(data["user"]["emailAddress"], "ada@example.com");
}

#[tokio::test]
async fn private_fields_are_not_exposed() {
    let response = schema().execute_query("{ user { secret } }").await;
    assert!(!response.errors.is_empty());
}

#[tokio::test]
async fn mutation_decodes_typed_arguments() {
    let response = schema()
        .execute_query(
            r#"mutation { createUser(email: "a@b.c", password: "pw") { id emailAddress } }"#,
        )
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json().unwrap();
    assert_eq!(data["createUser"]["id"], "1");
    assert_eq!(data["createUser"]["emailAddress"], "a@b.c");
}

#[tokio::test]
async fn required_arguments_are_enforced() {
    let response = schema()
        .execute_query(r#"mutation { createUser(email: "a@b.c") { id } }"#)
        .await;
    assert!(!response.errors.is_empty());
}

#[tokio::test]
async fn connection_pages_with_cursors() {
    let response = schema()
        .execute_query(
            "{ items(first: 2) { edges { cursor node { id } } pageInfo { hasMore endCursor } } }",
        )
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json().unwrap();
    let edges = data["items"]["edges"].as_array().unwrap();
    assert_eq!(edges.len(), 2);
    // Cursors are base64 of the key field.
    assert_eq!(edges[0]["cursor"], "MQ==");
    assert_eq!(edges[0]["node"]["id"], "1");
    assert_eq!(data["items"]["pageInfo"]["hasMore"], true);
    assert_eq!(data["items"]["pageInfo"]["endCursor"], "Mg==");
}

#[tokio::test]
async fn full_fit_page_has_no_more() {
    let response = schema()
        .execute_query("{ items { edges { node { label } } pageInfo { hasMore } } }")
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json().unwrap();
    assert_eq!(data["items"]["edges"].as_array().unwrap().len(), 5);
    assert_eq!(data["items"]["pageInfo"]["hasMore"], false);
}

#[tokio::test]
async fn enum_values_render_screaming_snake() {
    let response = schema().execute_query("{ status }").await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json().unwrap();
    assert_eq!(data["status"], "ACTIVE");
}

#[tokio::test]
async fn metadata_reaches_resolvers() {
    let mut metadata = RequestMetadata::default();
    metadata.headers.insert("x-user".into(), "ada".into());
    let response = schema().execute_with_metadata("{ who }", metadata).await;
    let data = response.data.into_json().unwrap();
    assert_eq!(data["who"], "ada");

    let response = schema().execute_query("{ who }").await;
    let data = response.data.into_json().unwrap();
    assert_eq!(data["who"], "anon");
}

#[tokio::test]
async fn sdl_names_relay_machinery() {
    let sdl = schema().sdl();
    for name in [
        "INode",
        "IEdge",
        "IPageInfo",
        "IConnection",
        "ItemNode",
        "ItemEdge",
        "ItemConnection",
        "PageInfo",
    ] {
        assert!(sdl.contains(name), "sdl is missing {name}:\n{sdl}");
    }
    assert!(
        sdl.contains("PageInfo implements IPageInfo"),
        "PageInfo does not implement IPageInfo:\n{sdl}"
    );
}

#[tokio::test]
async fn subscriptions_stream_events() {
    let schema = schema();
    let mut stream = schema.execute_stream("subscription { ticks }");
    let mut seen = Vec::new();
    while let Some(response) = stream.next().await {
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let data = response.data.into_json().unwrap();
        seen.push(data["ticks"].as_i64().unwrap());
    }
    assert_eq!(seen, vec![0, 1, 2]);
}

mod self_reference {
    use super::*;

    #[derive(Debug, Clone, Default, Reflect)]
    struct Category {
        pub id: Id,
        pub name: String,
        pub children: Vec<Category>,
    }

    #[derive(Default, Reflect)]
    #[graphql(resolvers)]
    struct TreeQuery {
        pub root: Option<Category>,
    }

    impl Resolvers for TreeQuery {
        fn resolvers(map: &mut ResolverMap<Self>) {
            map.field("root", |_: &TreeQuery, _| {
                Ok::<_, Infallible>(Some(Category {
                    id: "1".into(),
                    name: "all".into(),
                    children: vec![Category {
                        id: "2".into(),
                        name: "books".into(),
                        children: vec![Category {
                            id: "3".into(),
                            name: "poetry".into(),
                            children: Vec::new(),
                        }],
                    }],
                }))
            });
        }
    }

    #[tokio::test]
    async fn recursive_types_build_and_resolve() {
        let schema = SchemaBuilder::new()
            .query::<TreeQuery>()
            .finish()
            .expect("schema builds");
        let response = schema
            .execute_query("{ root { name children { name children { name children { name } } } } }")
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let data = response.data.into_json().unwrap();
        assert_eq!(data["root"]["name"], "all");
        assert_eq!(data["root"]["children"][0]["name"], "books");
        assert_eq!(data["root"]["children"][0]["children"][0]["name"], "poetry");
    }
}

mod build_failures {
    use super::*;

    #[derive(Default, Reflect)]
    struct OrphanQuery {
        #[relay]
        pub items: Vec<Item>,
    }

    #[test]
    fn paginated_field_without_resolver_fails_to_build() {
        let err = SchemaBuilder::new()
            .query::<OrphanQuery>()
            .finish()
            .unwrap_err();
        assert!(matches!(err, SchemaError::MissingConnectionResolver { .. }));
    }

    #[derive(Default, Reflect)]
    #[graphql(resolvers)]
    struct MismatchedQuery {
        #[relay]
        pub items: Vec<Item>,
    }

    impl Resolvers for MismatchedQuery {
        fn resolvers(map: &mut ResolverMap<Self>) {
            // Plain resolver on a paginated field.
            map.field("items", |_: &MismatchedQuery, _| {
                Ok::<_, Infallible>(Vec::<Item>::new())
            });
        }
    }

    #[test]
    #[should_panic(expected = "page arguments")]
    fn plain_resolver_on_paginated_field_panics() {
        let _ = SchemaBuilder::new().query::<MismatchedQuery>().finish();
    }
}
