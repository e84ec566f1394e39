//! An in-memory bookshop served through a graph.
//!
//! Books are listed by a custom request so the genre filter travels with the
//! query. Authors of a page of books are looked up in one batch.

use graphlayer_core::{GraphError, GraphResult, Object, SchemaResult, Value};
use graphlayer_runtime::{
    Cardinality, Dependencies, DependencyKey, Expander, GraphDefinition, Injected, ObjectBuilder,
    Request, RootResolver,
};
use graphlayer_schema::{
    key, EnumType, Field, ObjectQuery, ObjectType, Param, Query, Schema, TypeKey, TypeRef,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// A stored author.
#[derive(Debug, Clone)]
pub struct AuthorRecord {
    pub id: i64,
    pub name: String,
}

/// A stored book. `genre` holds the domain value of the `Genre` enum.
#[derive(Debug, Clone)]
pub struct BookRecord {
    pub id: i64,
    pub title: String,
    pub genre: String,
    pub author_id: i64,
}

/// The data store injected into the graph.
#[derive(Debug, Clone, Default)]
pub struct Bookshop {
    pub authors: Vec<AuthorRecord>,
    pub books: Vec<BookRecord>,
}

impl Bookshop {
    /// A small catalogue used by the command line.
    pub fn sample() -> Self {
        let author = |id: i64, name: &str| AuthorRecord {
            id,
            name: name.to_string(),
        };
        let book = |id: i64, title: &str, genre: &str, author_id: i64| BookRecord {
            id,
            title: title.to_string(),
            genre: genre.to_string(),
            author_id,
        };
        Self {
            authors: vec![author(1, "PG Wodehouse"), author(2, "William Shakespeare")],
            books: vec![
                book(1, "Leave It to Psmith", "comedy", 1),
                book(2, "Right Ho, Jeeves", "comedy", 1),
                book(3, "Pericles, Prince of Tyre", "drama", 2),
                book(4, "The Tempest", "comedy", 2),
            ],
        }
    }
}

/// Lists books, optionally restricted to one genre.
#[derive(Debug)]
struct BooksByGenre {
    genre: Option<String>,
    query: Query,
}

impl Request for BooksByGenre {
    fn type_key(&self) -> TypeKey {
        TypeKey::custom("books_by_genre")
    }
}

/// Looks up one author per id, in id order.
#[derive(Debug)]
struct AuthorsById {
    ids: Vec<i64>,
    query: Query,
}

impl Request for AuthorsById {
    fn type_key(&self) -> TypeKey {
        TypeKey::custom("authors_by_id")
    }
}

/// Builds the bookshop schema.
pub fn schema() -> SchemaResult<Schema> {
    Schema::builder()
        .add_enum(EnumType::new(
            "Genre",
            [("comedy", "COMEDY"), ("drama", "DRAMA")],
        )?)
        .add_object(ObjectType::new(
            "Author",
            [
                Field::new("id", TypeRef::int()),
                Field::new("name", TypeRef::string()),
            ],
        )?)
        .add_object(ObjectType::new(
            "Book",
            [
                Field::new("id", TypeRef::int()),
                Field::new("title", TypeRef::string()),
                Field::new("genre", TypeRef::named("Genre")),
                Field::new("author", TypeRef::named("Author")),
            ],
        )?)
        .add_object(
            ObjectType::new(
                "Root",
                [
                    Field::new("books", TypeRef::list(TypeRef::named("Book")))
                        .with_param(
                            Param::new("genre", TypeRef::nullable(TypeRef::named("Genre")))
                                .with_default(Value::Null),
                        )
                        .with_description("Books in catalogue order"),
                    Field::new("authors", TypeRef::list(TypeRef::named("Author"))),
                ],
            )?
            .with_description("Entry points of the bookshop"),
        )
        .build()
}

/// The bookshop schema together with its graph definition.
#[derive(Debug, Clone)]
pub struct BookshopGraph {
    schema: Arc<Schema>,
    definition: GraphDefinition,
}

impl BookshopGraph {
    pub fn new() -> GraphResult<Self> {
        let schema = Arc::new(schema()?);
        let definition = GraphDefinition::new(vec![
            root_resolver(&schema)?,
            books_by_genre(),
            author_list(&schema)?,
            authors_by_id(&schema)?,
        ])?;
        Ok(Self { schema, definition })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Builds `Root { books(genre) { id title genre author { name } } }`.
    pub fn books_query(&self, genre: Option<&str>, with_author: bool) -> SchemaResult<Query> {
        let root = self.schema.object("Root")?;
        let book = self.schema.object("Book")?;
        let author = self.schema.object("Author")?;

        let mut books = root
            .field("books")?
            .query()
            .arg("genre", genre.map(Value::enumeration))
            .select("id", book.field("id")?.select()?)
            .select("title", book.field("title")?.select()?)
            .select("genre", book.field("genre")?.select()?);
        if with_author {
            books = books.select(
                "author",
                book.field("author")?
                    .query()
                    .select("name", author.field("name")?.select()?)
                    .build()?,
            );
        }
        root.query([key("books", books.build()?)])
    }

    /// Builds `Root { authors { id name } }`.
    pub fn authors_query(&self) -> SchemaResult<Query> {
        let root = self.schema.object("Root")?;
        let author = self.schema.object("Author")?;
        root.query([key(
            "authors",
            root.field("authors")?
                .query()
                .select("id", author.field("id")?.select()?)
                .select("name", author.field("name")?.select()?)
                .build()?,
        )])
    }

    /// Resolves a query against `shop` and converts the result to JSON.
    pub fn execute(&self, shop: &Bookshop, query: &Query) -> GraphResult<JsonValue> {
        let graph = self
            .definition
            .create_graph(Dependencies::new().with(shop));
        let result = graph.resolve(query)?;
        query.to_json_value(&result)
    }
}

fn shop_dependency() -> (&'static str, DependencyKey) {
    ("shop", DependencyKey::of::<Bookshop>())
}

fn root_resolver(schema: &Schema) -> GraphResult<Expander> {
    let root = schema.object("Root")?;
    let expander = RootResolver::builder(&root)
        .field("books", |graph, query, args, _| {
            graph.resolve(&BooksByGenre {
                genre: args.get_as::<Option<String>>("genre")?,
                query: query.clone(),
            })
        })
        .field("authors", |graph, query, _, _| graph.resolve(query))
        .build()?;
    Ok(expander)
}

fn element_object(query: &Query) -> GraphResult<&ObjectQuery> {
    query.innermost_object().ok_or_else(|| GraphError::TypeMismatch {
        expected: "object query".to_string(),
        found: "scalar query",
    })
}

fn books_by_genre() -> Expander {
    let (param, dependency) = shop_dependency();
    Expander::for_request::<BooksByGenre, _>(TypeKey::custom("books_by_genre"), resolve_books)
        .with_dependency(param, dependency)
}

fn resolve_books(
    graph: &graphlayer_runtime::Graph<'_>,
    request: &BooksByGenre,
    injected: &Injected<'_>,
) -> GraphResult<Value> {
    let shop = injected.get::<Bookshop>("shop")?;
    let query = element_object(&request.query)?;
    let books: Vec<&BookRecord> = shop
        .books
        .iter()
        .filter(|book| request.genre.as_ref().map_or(true, |genre| book.genre == *genre))
        .collect();
    tracing::debug!(books = books.len(), genre = ?request.genre, "listing books");

    let mut objects: Vec<Object> = books
        .iter()
        .map(|_| Object::new().with_type_name(query.type_name()))
        .collect();
    for (key, field_query) in query.fields() {
        let column: Vec<Value> = match field_query.name() {
            "id" => books.iter().map(|book| Value::Int(book.id)).collect(),
            "title" => books.iter().map(|book| Value::from(book.title.as_str())).collect(),
            "genre" => books
                .iter()
                .map(|book| Value::enumeration(book.genre.as_str()))
                .collect(),
            "author" => {
                let authors = graph.resolve(&AuthorsById {
                    ids: books.iter().map(|book| book.author_id).collect(),
                    query: field_query.type_query().clone(),
                })?;
                match authors {
                    Value::List(authors) => authors,
                    other => {
                        return Err(GraphError::TypeMismatch {
                            expected: "List<Author>".to_string(),
                            found: other.kind(),
                        })
                    }
                }
            }
            other => {
                return Err(GraphError::MissingFieldResolver {
                    field: other.to_string(),
                })
            }
        };
        for (object, value) in objects.iter_mut().zip(column) {
            object.insert(key, value);
        }
    }
    Ok(Value::List(objects.into_iter().map(Value::Object).collect()))
}

fn author_builder(schema: &Schema) -> SchemaResult<ObjectBuilder<AuthorRecord>> {
    let author = schema.object("Author")?;
    ObjectBuilder::<AuthorRecord>::new(&author)
        .field("id", |record| record.id)?
        .field("name", |record| record.name.clone())
}

fn author_list(schema: &Schema) -> GraphResult<Expander> {
    let builder = author_builder(schema)?;
    let (param, dependency) = shop_dependency();
    let key = TypeKey::of(&TypeRef::list(TypeRef::named("Author")));
    Ok(Expander::for_query(key, move |_, query, injected| {
        let shop = injected.get::<Bookshop>("shop")?;
        let values = builder.build_all(element_object(query)?, &shop.authors)?;
        Ok(Value::List(values))
    })
    .with_dependency(param, dependency))
}

fn authors_by_id(schema: &Schema) -> GraphResult<Expander> {
    let builder = author_builder(schema)?;
    let (param, dependency) = shop_dependency();
    Ok(Expander::for_request::<AuthorsById, _>(
        TypeKey::custom("authors_by_id"),
        move |_, request, injected| {
            let shop = injected.get::<Bookshop>("shop")?;
            let query = element_object(&request.query)?;
            tracing::debug!(ids = request.ids.len(), "looking up authors");
            let authors = request
                .ids
                .iter()
                .map(|id| {
                    let matches = builder.build_all(
                        query,
                        shop.authors.iter().filter(|author| author.id == *id),
                    )?;
                    Cardinality::Single.apply(matches)
                })
                .collect::<GraphResult<Vec<_>>>()?;
            Ok(Value::List(authors))
        },
    )
    .with_dependency(param, dependency))
}
