//! The [`Executor`]: operation selection and execution.

use std::sync::Arc;

use apollo_compiler::ast;
use apollo_compiler::ast::OperationType;
use apollo_compiler::Node;
use indexmap::IndexMap;
use tracing::Instrument;

use crate::configuration::Configuration;
use crate::context::Context;
use crate::error::ExecutionError;
use crate::execution::evaluate;
use crate::execution::ExecutionContext;
use crate::json_ext::Object as JsonObject;
use crate::json_ext::Path;
use crate::object::Resolvable;
use crate::response::Response;
use crate::spec::operation_limits;
use crate::spec::Fragments;
use crate::spec::Selection;

/// Executes operations against root objects.
///
/// Holds one optional root object per operation kind, the [`Context`] handed to every
/// resolver, and the [`Configuration`]. Executions are independent of each other except
/// through the context, which is shared by all of them.
#[derive(Clone, Default)]
pub struct Executor {
    query: Option<Arc<dyn Resolvable>>,
    mutation: Option<Arc<dyn Resolvable>>,
    subscription: Option<Arc<dyn Resolvable>>,
    context: Context,
    configuration: Arc<Configuration>,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root object of query operations.
    pub fn with_query(mut self, root: impl Resolvable + 'static) -> Self {
        self.query = Some(Arc::new(root));
        self
    }

    /// Sets the root object of mutation operations.
    pub fn with_mutation(mut self, root: impl Resolvable + 'static) -> Self {
        self.mutation = Some(Arc::new(root));
        self
    }

    /// Sets the root object of subscription operations.
    ///
    /// Subscriptions are evaluated once, like queries, and produce a single response.
    pub fn with_subscription(mut self, root: impl Resolvable + 'static) -> Self {
        self.subscription = Some(Arc::new(root));
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = Arc::new(configuration);
        self
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    fn root(&self, operation_type: OperationType) -> Option<&Arc<dyn Resolvable>> {
        match operation_type {
            OperationType::Query => self.query.as_ref(),
            OperationType::Mutation => self.mutation.as_ref(),
            OperationType::Subscription => self.subscription.as_ref(),
        }
    }

    /// Executes an operation of `document`.
    ///
    /// `operation_name` may only be omitted when the document holds a single operation.
    /// `variables` are only used by `@skip` and `@include`: arguments are handed to resolvers
    /// as written.
    pub async fn execute(
        &self,
        document: &ast::Document,
        operation_name: Option<&str>,
        variables: Option<&JsonObject>,
    ) -> Result<Response, ExecutionError> {
        let span = tracing::info_span!(
            "execute",
            "graphql.operation.name" = operation_name.unwrap_or_default(),
            "graphql.operation.kind" = tracing::field::Empty,
        );
        self.execute_operation(document, operation_name, variables)
            .instrument(span)
            .await
            .inspect_err(|error| tracing::debug!("execution failed: {error}"))
    }

    async fn execute_operation(
        &self,
        document: &ast::Document,
        operation_name: Option<&str>,
        variables: Option<&JsonObject>,
    ) -> Result<Response, ExecutionError> {
        let fragments = Fragments::from_ast(document)?;
        let operation = select_operation(document, operation_name)?;
        let kind = operation_kind(operation.operation_type);
        tracing::Span::current().record("graphql.operation.kind", kind);

        let root = self
            .root(operation.operation_type)
            .ok_or(ExecutionError::UnsupportedOperation(kind))?;

        let empty = JsonObject::new();
        let selection = Selection::with_variables(
            &operation.selection_set,
            &fragments,
            variables.unwrap_or(&empty),
        )?;
        operation_limits::check(&self.configuration.limits, &selection)?;

        let ctx = ExecutionContext {
            context: &self.context,
            configuration: &self.configuration,
        };
        let value = evaluate(&ctx, root.as_ref(), &selection, &Path::empty()).await?;
        tracing::debug!("executed {kind} with {} root fields", value.len());
        Ok(Response { value })
    }
}

/// Picks the operation to execute out of the operations of `document`.
///
/// Operations are keyed by name, the anonymous operation by the empty string.
fn select_operation<'a>(
    document: &'a ast::Document,
    operation_name: Option<&str>,
) -> Result<&'a Node<ast::OperationDefinition>, ExecutionError> {
    let mut operations = IndexMap::new();
    for definition in &document.definitions {
        if let ast::Definition::OperationDefinition(operation) = definition {
            let name = operation.name.as_ref().map(|name| name.as_str()).unwrap_or("");
            if operations.insert(name, operation).is_some() {
                return Err(if name.is_empty() {
                    ExecutionError::AmbiguousOperation
                } else {
                    ExecutionError::DuplicateOperation(name.to_string())
                });
            }
        }
    }

    match operation_name {
        Some(name) => operations
            .get(name)
            .copied()
            .ok_or_else(|| ExecutionError::UnknownOperation(name.to_string())),
        None => match operations.len() {
            0 => Err(ExecutionError::NoOperation),
            1 => operations
                .first()
                .map(|(_, operation)| *operation)
                .ok_or(ExecutionError::NoOperation),
            _ => Err(ExecutionError::AmbiguousOperation),
        },
    }
}

fn operation_kind(operation_type: OperationType) -> &'static str {
    match operation_type {
        OperationType::Query => "query",
        OperationType::Mutation => "mutation",
        OperationType::Subscription => "subscription",
    }
}
