//! A tower [`Service`] executing operations.

use std::sync::Arc;
use std::task::Poll;

use apollo_compiler::ast;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json_bytes::ByteString;
use serde_json_bytes::Map as JsonMap;
use serde_json_bytes::Value;
use tower::BoxError;
use tower::Service;

use crate::executor::Executor;
use crate::response::Response;

pub type BoxService = tower::util::BoxService<Request, Response, BoxError>;
pub type BoxCloneService = tower::util::BoxCloneService<Request, Response, BoxError>;
pub type ServiceResult = Result<Response, BoxError>;

/// An execution request.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Request {
    /// The parsed document holding the operation.
    pub document: Arc<ast::Document>,

    /// The operation to execute, required if the document has several.
    pub operation_name: Option<String>,

    /// Variables, used by `@skip` and `@include`.
    pub variables: JsonMap<ByteString, Value>,
}

#[buildstructor::buildstructor]
impl Request {
    #[builder(visibility = "pub")]
    fn new(
        document: Arc<ast::Document>,
        operation_name: Option<String>,
        // Spelled out for buildstructor to generate a `variable(key, value)` setter
        variables: JsonMap<ByteString, Value>,
    ) -> Self {
        Self {
            document,
            operation_name,
            variables,
        }
    }
}

/// Executes requests with an [`Executor`].
#[derive(Clone)]
pub struct ExecutionService {
    executor: Arc<Executor>,
}

impl ExecutionService {
    pub fn new(executor: Arc<Executor>) -> Self {
        Self { executor }
    }

    pub fn boxed(self) -> BoxService {
        BoxService::new(self)
    }

    pub fn boxed_clone(self) -> BoxCloneService {
        BoxCloneService::new(self)
    }
}

impl Service<Request> for ExecutionService {
    type Response = Response;
    type Error = BoxError;
    type Future = BoxFuture<'static, ServiceResult>;

    fn poll_ready(&mut self, _cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Executions do not share any resource that could run out.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let executor = self.executor.clone();
        async move {
            let response = executor
                .execute(
                    &request.document,
                    request.operation_name.as_deref(),
                    Some(&request.variables),
                )
                .await?;
            Ok(response)
        }
        .boxed()
    }
}
