//! Resolution of interface queries through their implementations.
//!
//! A query over a list of an interface is narrowed into one query per
//! implementation. Each narrowed query is resolved by the expander of the
//! implementation's list type, and the results are concatenated.

use crate::expander::Expander;
use crate::graph::Graph;
use graphlayer_core::{GraphError, GraphResult, Value};
use graphlayer_schema::{Query, QueryKind, Schema, TypeKey, TypeRef};
use std::sync::Arc;

/// Resolves a list-of-interface query through each named implementation, in order.
pub fn resolve_implementations<S: AsRef<str>>(
    graph: &Graph<'_>,
    schema: &Schema,
    query: &Query,
    implementations: &[S],
) -> GraphResult<Value> {
    if !matches!(query.kind(), QueryKind::List(_)) {
        return Err(GraphError::TypeMismatch {
            expected: "list query".to_string(),
            found: "non-list query",
        });
    }

    let mut values = Vec::new();
    for implementation in implementations {
        let implementation = implementation.as_ref();
        let narrowed = query.map_innermost_object(|object| object.narrow(schema, implementation))?;
        tracing::debug!(implementation, "resolving interface implementation");
        match graph.resolve(&narrowed)? {
            Value::List(items) => values.extend(items),
            other => {
                return Err(GraphError::TypeMismatch {
                    expected: format!("List<{implementation}>"),
                    found: other.kind(),
                })
            }
        }
    }
    Ok(Value::List(values))
}

/// Creates the expander for `List<interface>` that resolves every
/// implementation declared in `schema`.
pub fn interface_list_resolver(schema: Arc<Schema>, interface: &str) -> Expander {
    let implementations: Vec<String> = schema
        .implementations(interface)
        .map(|ty| ty.name().to_string())
        .collect();
    let key = TypeKey::of(&TypeRef::list(TypeRef::named(interface)));

    Expander::for_query(key, move |graph, query, _| {
        resolve_implementations(graph, &schema, query, &implementations)
    })
}
