//! Evaluation of a [`Selection`] against a [`Resolvable`] object.

use futures::future::try_join_all;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json_bytes::ByteString;

use crate::configuration::Configuration;
use crate::context::Context;
use crate::error::ExecutionError;
use crate::json_ext::Object as JsonObject;
use crate::json_ext::Path;
use crate::json_ext::Value;
use crate::object::FieldEntry;
use crate::object::FieldValue;
use crate::object::Resolvable;
use crate::spec::Field;
use crate::spec::Selection;
use crate::spec::TYPENAME;

/// What evaluation needs from the executor.
pub(crate) struct ExecutionContext<'a> {
    pub(crate) context: &'a Context,
    pub(crate) configuration: &'a Configuration,
}

/// Evaluates `selection` against `object`.
///
/// Every field is checked against the object's kinds before any resolver runs. Sibling
/// fields are then resolved concurrently and assembled in selection order. The first sibling
/// to fail aborts the whole evaluation without waiting for the others.
pub(crate) fn evaluate<'a>(
    ctx: &'a ExecutionContext<'a>,
    object: &'a dyn Resolvable,
    selection: &'a Selection,
    path: &'a Path,
) -> BoxFuture<'a, Result<JsonObject, ExecutionError>> {
    async move {
        let mut applicable = Vec::with_capacity(selection.len());
        for (key, field) in selection.iter() {
            if field.applies_to(object.kinds()) {
                applicable.push((key, field));
            } else if ctx.configuration.execution.skip_inapplicable_fields {
                tracing::trace!(
                    "skipping field '{}' on kind '{}' at {path}",
                    field.name(),
                    object.kind()
                );
            } else {
                return Err(ExecutionError::UnknownField {
                    field: field.name().to_string(),
                    kind: object.kind().to_string(),
                    path: path.join(key),
                });
            }
        }

        let results = try_join_all(applicable.into_iter().map(|(key, field)| async move {
            let path = path.join(key);
            let value = resolve_field(ctx, object, field, &path).await?;
            Ok::<_, ExecutionError>((key, value))
        }))
        .await?;

        let mut output = JsonObject::new();
        for (key, value) in results {
            output.insert(ByteString::from(key), value);
        }
        Ok(output)
    }
    .boxed()
}

async fn resolve_field(
    ctx: &ExecutionContext<'_>,
    object: &dyn Resolvable,
    field: &Field,
    path: &Path,
) -> Result<Value, ExecutionError> {
    let value = match object.field(field.name()) {
        Some(FieldEntry::Value(value)) => value,
        Some(FieldEntry::Resolver(resolver)) => {
            resolver(field.arguments().clone(), ctx.context.clone())
                .await
                .map_err(|error| {
                    tracing::debug!("resolver for '{}' failed at {path}: {error}", field.name());
                    ExecutionError::Resolver {
                        field: field.name().to_string(),
                        path: path.clone(),
                        message: error.to_string(),
                    }
                })?
        }
        None if field.name() == TYPENAME && ctx.configuration.execution.typename => {
            FieldValue::from(object.kind())
        }
        None => {
            return Err(ExecutionError::UnknownField {
                field: field.name().to_string(),
                kind: object.kind().to_string(),
                path: path.clone(),
            })
        }
    };
    complete_value(ctx, field, value, path).await
}

fn complete_value<'a>(
    ctx: &'a ExecutionContext<'a>,
    field: &'a Field,
    value: FieldValue,
    path: &'a Path,
) -> BoxFuture<'a, Result<Value, ExecutionError>> {
    async move {
        match value {
            FieldValue::Leaf(value) => Ok(match field.selection() {
                Some(selection) => project(selection, value),
                None => value,
            }),
            FieldValue::Object(object) => {
                let selection =
                    field
                        .selection()
                        .ok_or_else(|| ExecutionError::MissingSelection {
                            field: field.name().to_string(),
                            kind: object.kind().to_string(),
                            path: path.clone(),
                        })?;
                let output = evaluate(ctx, object.as_ref(), selection, path).await?;
                Ok(Value::Object(output))
            }
            FieldValue::List(items) => {
                let items = try_join_all(items.into_iter().enumerate().map(
                    |(index, item)| async move {
                        let path = path.join(index);
                        complete_value(ctx, field, item, &path).await
                    },
                ))
                .await?;
                Ok(Value::Array(items))
            }
        }
    }
    .boxed()
}

/// Projects plain JSON data on a selection, looking subfields up by their underlying name.
///
/// Missing subfields are `null`, and there are no type conditions to check.
fn project(selection: &Selection, value: Value) -> Value {
    match value {
        Value::Object(data) => Value::Object(
            selection
                .iter()
                .map(|(key, field)| {
                    let value = data.get(field.name()).cloned().unwrap_or(Value::Null);
                    let value = match field.selection() {
                        Some(selection) => project(selection, value),
                        None => value,
                    };
                    (ByteString::from(key), value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| project(selection, item))
                .collect(),
        ),
        value => value,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use apollo_compiler::ast;
    use serde_json_bytes::json;
    use tokio::sync::Barrier;

    use super::*;
    use crate::configuration::Execution;
    use crate::object::FieldResult;
    use crate::object::Object;
    use crate::spec::Fragments;
    use crate::Arguments;
    use crate::KindSet;

    fn selection(query: &str) -> Selection {
        let document = ast::Document::parse(query, "query.graphql").unwrap();
        let fragments = Fragments::from_ast(&document).unwrap();
        let Some(ast::Definition::OperationDefinition(operation)) = document.definitions.first()
        else {
            panic!("expected an operation")
        };
        Selection::from_ast(&operation.selection_set, &fragments).unwrap()
    }

    async fn run(
        object: &dyn Resolvable,
        query: &str,
        configuration: &Configuration,
        context: &Context,
    ) -> Result<Value, ExecutionError> {
        let ctx = ExecutionContext {
            context,
            configuration,
        };
        let selection = selection(query);
        let output = evaluate(&ctx, object, &selection, &Path::empty()).await?;
        Ok(Value::Object(output))
    }

    async fn eval(object: &dyn Resolvable, query: &str) -> Result<Value, ExecutionError> {
        run(object, query, &Configuration::default(), &Context::new()).await
    }

    fn animal() -> KindSet {
        KindSet::new("Animal")
    }

    fn dog() -> Object {
        Object::with_parents("Dog", [&animal()])
            .value("name", "Rex")
            .value("barks", true)
    }

    fn cat() -> Object {
        Object::with_parents("Cat", [&animal()])
            .value("name", "Tom")
            .value("meows", true)
    }

    #[tokio::test]
    async fn output_follows_selection_order() {
        let object = Object::new("Query")
            .resolver("slow", |_, _| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok("slow".into())
            })
            .resolver("fast", |_, _| async { Ok("fast".into()) });
        let value = eval(&object, "{ slow fast again: slow }").await.unwrap();
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"slow":"slow","fast":"fast","again":"slow"}"#
        );
    }

    #[tokio::test]
    async fn siblings_resolve_concurrently() {
        let barrier = Arc::new(Barrier::new(2));
        let (first, second) = (barrier.clone(), barrier);
        let object = Object::new("Query")
            .resolver("a", move |_, _| {
                let barrier = first.clone();
                async move {
                    barrier.wait().await;
                    Ok("a".into())
                }
            })
            .resolver("b", move |_, _| {
                let barrier = second.clone();
                async move {
                    barrier.wait().await;
                    Ok("b".into())
                }
            });
        let value = tokio::time::timeout(Duration::from_secs(5), eval(&object, "{ a b }"))
            .await
            .expect("sibling resolvers did not run concurrently")
            .unwrap();
        assert_eq!(value, json!({ "a": "a", "b": "b" }));
    }

    #[tokio::test]
    async fn type_conditions() {
        let query = "{ name ... on Dog { barks } ... on Cat { meows } }";
        assert_eq!(
            eval(&dog(), "{ name ... on Dog { barks } }").await.unwrap(),
            json!({ "name": "Rex", "barks": true })
        );
        assert_eq!(
            eval(&dog(), query).await.unwrap_err(),
            ExecutionError::UnknownField {
                field: "meows".to_string(),
                kind: "Dog".to_string(),
                path: Path::empty().join("meows"),
            }
        );

        let configuration = Configuration::builder()
            .execution(Execution::builder().skip_inapplicable_fields(true).build())
            .build();
        let context = Context::new();
        assert_eq!(
            run(&dog(), query, &configuration, &context).await.unwrap(),
            json!({ "name": "Rex", "barks": true })
        );
        assert_eq!(
            run(&cat(), query, &configuration, &context).await.unwrap(),
            json!({ "name": "Tom", "meows": true })
        );
    }

    #[tokio::test]
    async fn parent_kinds_apply() {
        assert_eq!(
            eval(&dog(), "{ ... on Animal { name } }").await.unwrap(),
            json!({ "name": "Rex" })
        );
    }

    #[tokio::test]
    async fn inapplicable_fields_fail_before_resolvers_run() {
        let context = Context::new();
        let object = Object::with_parents("Dog", [&animal()])
            .resolver("name", |_, context: Context| async move {
                context.insert("resolved", true)?;
                Ok("Rex".into())
            });
        let error = run(
            &object,
            "{ name ... on Cat { meows } }",
            &Configuration::default(),
            &context,
        )
        .await
        .unwrap_err();
        assert!(matches!(error, ExecutionError::UnknownField { .. }));
        assert!(!context.contains_key("resolved"));
    }

    #[tokio::test]
    async fn missing_field() {
        assert_eq!(
            eval(&dog(), "{ name age }").await.unwrap_err().to_string(),
            "cannot query field 'age' on kind 'Dog' at /age"
        );
    }

    #[tokio::test]
    async fn typename() {
        assert_eq!(
            eval(&dog(), "{ __typename kind: __typename }").await.unwrap(),
            json!({ "__typename": "Dog", "kind": "Dog" })
        );

        let configuration = Configuration::builder()
            .execution(Execution::builder().typename(false).build())
            .build();
        assert!(
            run(&dog(), "{ __typename }", &configuration, &Context::new())
                .await
                .is_err()
        );

        let renamed = Object::new("Dog").value("__typename", "Hound");
        assert_eq!(
            eval(&renamed, "{ __typename }").await.unwrap(),
            json!({ "__typename": "Hound" })
        );
    }

    #[tokio::test]
    async fn nested_objects_and_lists() {
        let object = Object::new("Query")
            .value("pet", dog())
            .value("pets", vec![dog(), cat()])
            .value("matrix", vec![FieldValue::from(vec![FieldValue::from(1)])]);
        assert_eq!(
            eval(
                &object,
                "{ pet { name } pets { name ... on Dog { barks } } matrix }"
            )
            .await
            .unwrap_err(),
            ExecutionError::UnknownField {
                field: "barks".to_string(),
                kind: "Cat".to_string(),
                path: Path::empty().join("pets").join(1usize).join("barks"),
            }
        );
        assert_eq!(
            eval(&object, "{ pet { name } pets { name } matrix }")
                .await
                .unwrap(),
            json!({
                "pet": { "name": "Rex" },
                "pets": [{ "name": "Rex" }, { "name": "Tom" }],
                "matrix": [[1]],
            })
        );
    }

    #[tokio::test]
    async fn objects_need_a_selection() {
        let object = Object::new("Query").value("pet", dog());
        assert_eq!(
            eval(&object, "{ pet }").await.unwrap_err().to_string(),
            "field 'pet' of kind 'Dog' requires a selection of subfields at /pet"
        );
    }

    #[tokio::test]
    async fn plain_json_is_projected() {
        let object = Object::new("Query").value(
            "data",
            json!({
                "name": "Rex",
                "owner": { "name": "Ann", "age": 40 },
                "toys": [{ "kind": "ball", "color": "red" }, { "kind": "bone" }],
                "unused": true,
            }),
        );
        assert_eq!(
            eval(
                &object,
                "{ data { owner { name } n: name toys { kind color } missing } }"
            )
            .await
            .unwrap(),
            json!({
                "data": {
                    "owner": { "name": "Ann" },
                    "n": "Rex",
                    "toys": [
                        { "kind": "ball", "color": "red" },
                        { "kind": "bone", "color": null },
                    ],
                    "missing": null,
                }
            })
        );
        assert_eq!(
            eval(&object, "{ data { unused } }").await.unwrap(),
            json!({ "data": { "unused": true } })
        );
    }

    #[tokio::test]
    async fn resolver_errors_carry_the_path() {
        let object = Object::new("Query").value(
            "pet",
            Object::new("Dog").resolver("name", |_, _| async { Err("no name".into()) }),
        );
        assert_eq!(
            eval(&object, "{ pet { name } }").await.unwrap_err(),
            ExecutionError::Resolver {
                field: "name".to_string(),
                path: Path::empty().join("pet").join("name"),
                message: "no name".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn a_failing_sibling_aborts_the_evaluation() {
        let object = Object::new("Query")
            .resolver("stuck", |_, _| futures::future::pending::<FieldResult>())
            .resolver("broken", |_, _| async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err("boom".into())
            });
        let query = "{ stuck broken }";
        let error = tokio::time::timeout(Duration::from_secs(5), eval(&object, query))
            .await
            .expect("the failure waited for a sibling that never completes")
            .unwrap_err();
        assert_eq!(
            error,
            ExecutionError::Resolver {
                field: "broken".to_string(),
                path: Path::empty().join("broken"),
                message: "boom".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn a_failing_list_element_aborts_the_evaluation() {
        let stuck = Object::new("Dog")
            .resolver("name", |_, _| futures::future::pending::<FieldResult>());
        let broken = Object::new("Dog").resolver("name", |_, _| async { Err("boom".into()) });
        let object = Object::new("Query").value("pets", vec![stuck, broken]);
        let query = "{ pets { name } }";
        let error = tokio::time::timeout(Duration::from_secs(5), eval(&object, query))
            .await
            .expect("the failure waited for an element that never completes")
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "resolver for field 'name' failed at /pets/1/name: boom"
        );
    }

    #[tokio::test]
    async fn resolvers_receive_arguments() {
        let object = Object::new("Query").resolver("greet", |arguments: Arguments, _| async move {
            let name = arguments.get_str("name").unwrap_or("nobody");
            Ok(format!("hello {name}").into())
        });
        assert_eq!(
            eval(&object, r#"{ a: greet(name: "Ann") b: greet }"#)
                .await
                .unwrap(),
            json!({ "a": "hello Ann", "b": "hello nobody" })
        );
    }
}
