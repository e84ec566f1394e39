//! Building object results from source records.

use graphlayer_core::{GraphError, GraphResult, Object, SchemaResult, Value};
use graphlayer_schema::{FieldQuery, ObjectQuery, ObjectType};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

type Getter<S> = Arc<dyn Fn(&S, &FieldQuery) -> GraphResult<Value> + Send + Sync>;

/// Builds the [`Object`] for an object query out of a record of type `S`,
/// using one getter per field.
pub struct ObjectBuilder<S> {
    object_type: Arc<ObjectType>,
    getters: FxHashMap<String, Getter<S>>,
}

impl<S> Clone for ObjectBuilder<S> {
    fn clone(&self) -> Self {
        Self {
            object_type: Arc::clone(&self.object_type),
            getters: self.getters.clone(),
        }
    }
}

impl<S> fmt::Debug for ObjectBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBuilder")
            .field("object_type", &self.object_type.name())
            .field("fields", &self.getters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<S> ObjectBuilder<S> {
    pub fn new(object_type: &ObjectType) -> Self {
        Self {
            object_type: Arc::new(object_type.clone()),
            getters: FxHashMap::default(),
        }
    }

    /// Registers a getter for a field that reads the record only.
    pub fn field<F, V>(self, name: &str, getter: F) -> SchemaResult<Self>
    where
        F: Fn(&S) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.field_with_query(name, move |source, _| Ok(getter(source).into()))
    }

    /// Registers a getter that also sees the field query, for fields with
    /// arguments or nested selections.
    pub fn field_with_query<F>(mut self, name: &str, getter: F) -> SchemaResult<Self>
    where
        F: Fn(&S, &FieldQuery) -> GraphResult<Value> + Send + Sync + 'static,
    {
        self.object_type.field(name)?;
        self.getters.insert(name.to_string(), Arc::new(getter));
        Ok(self)
    }

    /// Builds the object for one record.
    pub fn build(&self, query: &ObjectQuery, source: &S) -> GraphResult<Object> {
        let mut object = Object::new().with_type_name(query.type_name());
        for (key, field_query) in query.fields() {
            let getter = self
                .getters
                .get(field_query.name())
                .ok_or_else(|| GraphError::MissingFieldResolver {
                    field: field_query.name().to_string(),
                })?;
            object.insert(key, getter(source, field_query)?);
        }
        Ok(object)
    }

    /// Builds one object value per record, preserving order.
    pub fn build_all<'s, I>(&self, query: &ObjectQuery, sources: I) -> GraphResult<Vec<Value>>
    where
        I: IntoIterator<Item = &'s S>,
        S: 's,
    {
        sources
            .into_iter()
            .map(|source| self.build(query, source).map(Value::Object))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphlayer_schema::{key, Field, Schema, TypeRef};

    struct UserRecord {
        name: String,
        age: i64,
    }

    fn schema() -> Schema {
        Schema::builder()
            .add_object(
                ObjectType::new(
                    "User",
                    [
                        Field::new("name", TypeRef::string()),
                        Field::new("age", TypeRef::int()),
                    ],
                )
                .unwrap(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_uses_query_keys() {
        let schema = schema();
        let user = schema.object("User").unwrap();
        let builder = ObjectBuilder::<UserRecord>::new(&user)
            .field("name", |record| record.name.clone())
            .unwrap()
            .field("age", |record| record.age)
            .unwrap();

        let query = user
            .query([
                key("years", user.field("age").unwrap().select().unwrap()),
                key("name", user.field("name").unwrap().select().unwrap()),
            ])
            .unwrap();
        let record = UserRecord {
            name: "Bob".to_string(),
            age: 42,
        };

        let object = builder.build(query.as_object().unwrap(), &record).unwrap();
        assert_eq!(object.type_name(), Some("User"));
        assert_eq!(object.keys().collect::<Vec<_>>(), vec!["years", "name"]);
        assert_eq!(object.get("years"), Some(&Value::Int(42)));
    }

    #[test]
    fn test_missing_getter_fails() {
        let schema = schema();
        let user = schema.object("User").unwrap();
        let builder = ObjectBuilder::<UserRecord>::new(&user)
            .field("name", |record| record.name.clone())
            .unwrap();
        let query = user
            .query([key("age", user.field("age").unwrap().select().unwrap())])
            .unwrap();
        let record = UserRecord {
            name: "Bob".to_string(),
            age: 42,
        };

        let err = builder.build(query.as_object().unwrap(), &record).unwrap_err();
        assert_eq!(err.to_string(), "resolver missing for field age");
    }

    #[test]
    fn test_getter_for_unknown_field_is_rejected() {
        let schema = schema();
        let user = schema.object("User").unwrap();
        let err = ObjectBuilder::<UserRecord>::new(&user)
            .field("email", |record| record.name.clone())
            .unwrap_err();
        assert_eq!(err.to_string(), "User has no field email");
    }
}
