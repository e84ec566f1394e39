//! Integration tests for query resolution.

use graphlayer_runtime::{
    constant_object_resolver, Cardinality, Dependencies, DependencyKey, Expander, ExpanderGroup,
    Expanders, GraphDefinition, GraphError, Object, Request, RootResolver, Value,
};
use graphlayer_schema::{key, Field, ObjectType, Param, Query, Schema, TypeKey, TypeRef};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn book_schema() -> Schema {
    Schema::builder()
        .add_object(
            ObjectType::new(
                "Root",
                [
                    Field::new("books", TypeRef::list(TypeRef::named("Book"))),
                    Field::new("book", TypeRef::named("Book"))
                        .with_param(Param::new("arg0", TypeRef::int())),
                ],
            )
            .unwrap(),
        )
        .add_object(ObjectType::new("Book", [Field::new("title", TypeRef::string())]).unwrap())
        .build()
        .unwrap()
}

/// Test resolving a query with a constant expander.
#[test]
fn test_constant_book() {
    let schema = book_schema();
    let book = schema.object("Book").unwrap();
    let definition =
        GraphDefinition::new(constant_object_resolver(&book, [("title", "Leave it to Psmith")]))
            .unwrap();
    let graph = definition.create_graph(Dependencies::new());

    let query = book
        .query([key("title", book.field("title").unwrap().select().unwrap())])
        .unwrap();
    let result = graph.resolve(&query).unwrap();

    assert_eq!(
        query.to_json_value(&result).unwrap(),
        json!({"title": "Leave it to Psmith"})
    );
}

/// Test a root resolver whose field resolves a nested list query.
#[test]
fn test_root_books_list() {
    let schema = book_schema();
    let root = schema.object("Root").unwrap();
    let book = schema.object("Book").unwrap();

    let books = Expander::for_query(
        TypeKey::of(&TypeRef::list(TypeRef::named("Book"))),
        |_, query, _| {
            let object = query
                .innermost_object()
                .ok_or_else(|| GraphError::custom("expected a list of books"))?;
            let titles = ["Leave it to Psmith", "Pericles, Prince of Tyre"];
            let books = titles
                .iter()
                .map(|title| {
                    let values = object
                        .fields()
                        .map(|(key, _)| (key, *title))
                        .collect::<Vec<_>>();
                    Value::from(object.create_object(values))
                })
                .collect();
            Ok(Value::List(books))
        },
    );
    let root_resolver = RootResolver::builder(&root)
        .field("books", |graph, query, _, _| graph.resolve(query))
        .build()
        .unwrap();

    let definition = GraphDefinition::new(vec![root_resolver, books]).unwrap();
    let graph = definition.create_graph(Dependencies::new());

    let query = root
        .query([key(
            "books",
            root.field("books")
                .unwrap()
                .query()
                .select("title", book.field("title").unwrap().select().unwrap())
                .build()
                .unwrap(),
        )])
        .unwrap();
    let result = graph.resolve(&query).unwrap();

    assert_eq!(
        query.to_json_value(&result).unwrap(),
        json!({
            "books": [
                {"title": "Leave it to Psmith"},
                {"title": "Pericles, Prince of Tyre"}
            ]
        })
    );
}

/// Test that a required param without a value fails at binding time.
#[test]
fn test_missing_param_value() {
    let schema = book_schema();
    let root = schema.object("Root").unwrap();

    let err = root.field("book").unwrap().select().unwrap_err();
    assert_eq!(err.to_string(), "missing value for arg0");

    let err = root.field("book").unwrap().param("arg1").unwrap_err();
    assert_eq!(err.to_string(), "book has no param arg1");
}

/// Test expanders for the same type isolated by tag.
#[test]
fn test_tagged_expanders() {
    let schema = book_schema();
    let book = schema.object("Book").unwrap();

    let tagged = |tag: &'static str| {
        Expander::for_query(TypeKey::named("Book").tagged(tag), move |_, query, _| {
            let object = query
                .as_object()
                .ok_or_else(|| GraphError::custom("expected a book query"))?;
            Ok(object.create_object([("title", tag)]).into())
        })
    };
    let definition = GraphDefinition::new([tagged("author"), tagged("reader")]).unwrap();
    let graph = definition.create_graph(Dependencies::new());

    let query = book
        .query([key("title", book.field("title").unwrap().select().unwrap())])
        .unwrap();

    let by_author = graph.resolve(&query.clone().tagged("author")).unwrap();
    let by_reader = graph.resolve(&query.clone().tagged("reader")).unwrap();
    assert_eq!(by_author.get("title"), Some(&Value::from("author")));
    assert_eq!(by_reader.get("title"), Some(&Value::from("reader")));

    let err = graph.resolve(&query).unwrap_err();
    assert_eq!(err.to_string(), "resolver missing for type Book");
}

/// Test that a dispatch miss runs no expander.
#[test]
fn test_dispatch_miss_has_no_side_effects() {
    let schema = book_schema();
    let root = schema.object("Root").unwrap();
    let book = schema.object("Book").unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    let root_resolver = RootResolver::builder(&root)
        .field("books", move |graph, query, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            graph.resolve(query)
        })
        .build()
        .unwrap();
    let definition = GraphDefinition::new(root_resolver).unwrap();
    let graph = definition.create_graph(Dependencies::new());

    let err = graph
        .resolve(
            &book
                .query([key("title", book.field("title").unwrap().select().unwrap())])
                .unwrap(),
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "resolver missing for type Book");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

fn numbered(name: &str, value: i64) -> Expander {
    Expander::new(TypeKey::custom(name), move |_, _, _| Ok(Value::Int(value)))
}

struct Pair;

impl ExpanderGroup for Pair {
    fn expanders(&self) -> Expanders {
        [numbered("d", 4), numbered("e", 5)].into()
    }
}

#[derive(Debug)]
struct Lookup(&'static str);

impl Request for Lookup {
    fn type_key(&self) -> TypeKey {
        TypeKey::custom(self.0)
    }
}

/// Test that nested registration yields the same registry as a flat one.
#[test]
fn test_flattening() {
    let nested = GraphDefinition::new(vec![
        Expanders::from(numbered("a", 1)),
        Expanders::from([numbered("b", 2), numbered("c", 3)]),
        Expanders::group(&Pair),
    ])
    .unwrap();
    let flat = GraphDefinition::new(vec![
        numbered("a", 1),
        numbered("b", 2),
        numbered("c", 3),
        numbered("d", 4),
        numbered("e", 5),
    ])
    .unwrap();

    assert_eq!(nested.len(), flat.len());
    let nested_graph = nested.create_graph(Dependencies::new());
    let flat_graph = flat.create_graph(Dependencies::new());
    for name in ["a", "b", "c", "d", "e"] {
        assert!(nested.contains(&TypeKey::custom(name)));
        assert_eq!(
            nested_graph.resolve(&Lookup(name)).unwrap(),
            flat_graph.resolve(&Lookup(name)).unwrap()
        );
    }
}

struct Library {
    titles: Vec<(i64, &'static str)>,
}

#[derive(Debug)]
struct TitlesById {
    ids: Vec<i64>,
}

impl Request for TitlesById {
    fn type_key(&self) -> TypeKey {
        TypeKey::custom("titles_by_id")
    }
}

/// Test dependency injection into a custom request expander.
#[test]
fn test_dependencies_are_injected() {
    let schema = book_schema();
    let root = schema.object("Root").unwrap();
    let book = schema.object("Book").unwrap();

    let titles_by_id = Expander::for_request::<TitlesById, _>(
        TypeKey::custom("titles_by_id"),
        |_, request, injected| {
            let library = injected.get::<Library>("library")?;
            request
                .ids
                .iter()
                .map(|id| {
                    let matches = library
                        .titles
                        .iter()
                        .filter(|(book_id, _)| book_id == id)
                        .map(|(_, title)| Value::from(*title))
                        .collect();
                    Cardinality::Single.apply(matches)
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
        },
    )
    .with_dependency("library", DependencyKey::of::<Library>());

    let root_resolver = RootResolver::builder(&root)
        .field("book", |graph, query, args, _| {
            let id = args.get_as::<i64>("arg0")?;
            let titles = graph.resolve(&TitlesById { ids: vec![id] })?;
            let title = titles.as_list().and_then(|t| t.first()).cloned().unwrap_or_default();
            let object = query
                .as_object()
                .ok_or_else(|| GraphError::custom("expected a book query"))?;
            let values = object.fields().map(|(key, _)| (key, title.clone())).collect::<Vec<_>>();
            Ok(Object::typed("Book", values).into())
        })
        .build()
        .unwrap();

    let library = Library {
        titles: vec![(1, "Leave it to Psmith"), (2, "Right Ho, Jeeves")],
    };
    let definition = GraphDefinition::new(vec![root_resolver, titles_by_id]).unwrap();
    let graph = definition.create_graph(Dependencies::new().with(&library));

    let query = root
        .query([key(
            "book",
            root.field("book")
                .unwrap()
                .query()
                .arg("arg0", 2)
                .select("title", book.field("title").unwrap().select().unwrap())
                .build()
                .unwrap(),
        )])
        .unwrap();
    let result = graph.resolve(&query).unwrap();
    assert_eq!(
        query.to_json_value(&result).unwrap(),
        json!({"book": {"title": "Right Ho, Jeeves"}})
    );

    let err = graph.resolve(&TitlesById { ids: vec![3] }).unwrap_err();
    assert_eq!(err.to_string(), "expected exactly one value but got 0");

    let unbound = definition.create_graph(Dependencies::new());
    let err = unbound.resolve(&query).unwrap_err();
    assert!(matches!(err, GraphError::MissingDependency { .. }));
}

/// Test that a request of the wrong type is rejected by a typed expander.
#[test]
fn test_unexpected_request() {
    let definition = GraphDefinition::new(
        Expander::for_request::<TitlesById, _>(TypeKey::custom("titles_by_id"), |_, _, _| {
            Ok(Value::Null)
        }),
    )
    .unwrap();
    let graph = definition.create_graph(Dependencies::new());

    let err = graph
        .resolve_as(&TypeKey::custom("titles_by_id"), &Lookup("titles_by_id"))
        .unwrap_err();
    assert!(matches!(err, GraphError::UnexpectedRequest { .. }));
    assert!(matches!(
        graph.resolve(&Query::list(book_query())),
        Err(GraphError::MissingResolver { .. })
    ));
}

fn book_query() -> Query {
    let schema = book_schema();
    let book = schema.object("Book").unwrap();
    book.query([key("title", book.field("title").unwrap().select().unwrap())])
        .unwrap()
}
