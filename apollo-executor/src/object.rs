//! Resolvable objects: the nodes of the data graph operations are executed against.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;
use tower::BoxError;

use crate::json_ext::Value;
use crate::kinds::KindSet;
use crate::Arguments;
use crate::Context;

/// The result of resolving a field.
pub type FieldResult = Result<FieldValue, BoxError>;

/// A field resolver.
///
/// Called with the arguments of the requested field and the executor's [`Context`].
pub type Resolver =
    Arc<dyn Fn(Arguments, Context) -> BoxFuture<'static, FieldResult> + Send + Sync>;

/// A node of the data graph.
///
/// Implementations expose their capability tags, used to decide whether type-conditional
/// fields apply to them, and a lookup from field name to value or resolver.
pub trait Resolvable: Send + Sync {
    /// The kind of this object and every kind it is compatible with.
    fn kinds(&self) -> &KindSet;

    /// The field named `name`, `None` if this object has no such field.
    fn field(&self, name: &str) -> Option<FieldEntry>;

    /// The declared kind name.
    fn kind(&self) -> &str {
        self.kinds().kind()
    }
}

/// What an object holds for one of its fields.
#[derive(Clone)]
pub enum FieldEntry {
    /// A value, returned as is.
    Value(FieldValue),
    /// A function computing the value from the field's arguments.
    Resolver(Resolver),
}

/// A resolved field value.
#[derive(Clone)]
pub enum FieldValue {
    /// Plain JSON data.
    ///
    /// If the field has subfields and the data is a JSON object, the object is projected on
    /// them by name.
    Leaf(Value),
    /// An object the field's subselection is evaluated against.
    Object(Arc<dyn Resolvable>),
    /// A list, completed element by element.
    List(Vec<FieldValue>),
}

/// An object holding its fields in a map.
#[derive(Clone)]
pub struct Object {
    kinds: KindSet,
    fields: IndexMap<String, FieldEntry>,
}

impl Object {
    /// An object of the given kind, without fields.
    pub fn new(kind: impl Into<String>) -> Self {
        Self::with_kinds(KindSet::new(kind))
    }

    /// An object of the given kind, also compatible with every kind of `parents`.
    pub fn with_parents<'a>(
        kind: impl Into<String>,
        parents: impl IntoIterator<Item = &'a KindSet>,
    ) -> Self {
        Self::with_kinds(KindSet::with_parents(kind, parents))
    }

    pub fn with_kinds(kinds: KindSet) -> Self {
        Self {
            kinds,
            fields: IndexMap::new(),
        }
    }

    /// Sets a field to a value.
    pub fn value(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), FieldEntry::Value(value.into()));
        self
    }

    /// Sets a field to a resolver.
    pub fn resolver<F, Fut>(mut self, name: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(Arguments, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FieldResult> + Send + 'static,
    {
        let resolver: Resolver =
            Arc::new(move |arguments, context| resolver(arguments, context).boxed());
        self.fields.insert(name.into(), FieldEntry::Resolver(resolver));
        self
    }

    /// Field names, in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl Resolvable for Object {
    fn kinds(&self) -> &KindSet {
        &self.kinds
    }

    fn field(&self, name: &str) -> Option<FieldEntry> {
        self.fields.get(name).cloned()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("kinds", &self.kinds)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Leaf(value) => f.debug_tuple("Leaf").field(value).finish(),
            FieldValue::Object(object) => f.debug_tuple("Object").field(&object.kind()).finish(),
            FieldValue::List(items) => f.debug_tuple("List").field(items).finish(),
        }
    }
}

impl FieldValue {
    pub fn null() -> Self {
        FieldValue::Leaf(Value::Null)
    }

    pub fn object(object: impl Resolvable + 'static) -> Self {
        FieldValue::Object(Arc::new(object))
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Leaf(value)
    }
}

impl From<Object> for FieldValue {
    fn from(object: Object) -> Self {
        FieldValue::Object(Arc::new(object))
    }
}

impl From<Arc<dyn Resolvable>> for FieldValue {
    fn from(object: Arc<dyn Resolvable>) -> Self {
        FieldValue::Object(object)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(items: Vec<FieldValue>) -> Self {
        FieldValue::List(items)
    }
}

impl From<Vec<Object>> for FieldValue {
    fn from(items: Vec<Object>) -> Self {
        FieldValue::List(items.into_iter().map(FieldValue::from).collect())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Leaf(value.into())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Leaf(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Leaf(value.into())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Leaf(value.into())
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Leaf(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Leaf(value.into())
    }
}

#[cfg(test)]
mod tests {
    use serde_json_bytes::json;

    use super::*;

    #[test]
    fn fields_keep_insertion_order() {
        let object = Object::new("Dog")
            .value("name", "Rex")
            .value("age", 3)
            .resolver("bark", |_, _| async { Ok("woof".into()) })
            .value("name", "Max");
        assert_eq!(
            object.field_names().collect::<Vec<_>>(),
            vec!["name", "age", "bark"]
        );
        assert!(matches!(
            object.field("name"),
            Some(FieldEntry::Value(FieldValue::Leaf(value))) if value == json!("Max")
        ));
        assert!(matches!(object.field("bark"), Some(FieldEntry::Resolver(_))));
        assert!(object.field("meow").is_none());
    }

    #[test]
    fn parents_give_capability_tags() {
        let animal = Object::new("Animal");
        let dog = Object::with_parents("Dog", [animal.kinds()]);
        assert_eq!(dog.kind(), "Dog");
        assert!(dog.kinds().contains("Animal"));
        assert!(!animal.kinds().contains("Dog"));
    }

    #[tokio::test]
    async fn resolvers_receive_arguments_and_context() {
        let object = Object::new("Query").resolver(
            "echo",
            |arguments: Arguments, context: Context| async move {
                context.insert("called", true)?;
                Ok(FieldValue::from(arguments.len() as i64))
            },
        );
        let Some(FieldEntry::Resolver(resolver)) = object.field("echo") else {
            panic!("expected a resolver")
        };
        let context = Context::new();
        let value = resolver(Arguments::default(), context.clone()).await.unwrap();
        assert!(matches!(value, FieldValue::Leaf(value) if value == json!(0)));
        assert_eq!(context.get("called").unwrap(), Some(true));
    }
}
