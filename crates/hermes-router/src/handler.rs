//! Route handler contract.

use async_trait::async_trait;
use hermes_core::ArgumentValue;
use std::future::Future;

/// A route's target: invoked with the bound argument values in declaration
/// order once every required argument is satisfied.
///
/// # Example
///
/// ```rust
/// use hermes_router::{FnRouteHandler, RouteHandler};
/// use hermes_core::ArgumentValue;
///
/// let handler = FnRouteHandler::new(|args: Vec<ArgumentValue>| async move {
///     Ok(ArgumentValue::Int(args.len() as i64))
/// });
/// ```
#[async_trait]
pub trait RouteHandler: Send + Sync {
    /// Invokes the handler with the bound argument values.
    async fn call(&self, args: Vec<ArgumentValue>) -> anyhow::Result<ArgumentValue>;
}

/// A function-based route handler.
pub struct FnRouteHandler<F> {
    func: F,
}

impl<F, Fut> FnRouteHandler<F>
where
    F: Fn(Vec<ArgumentValue>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ArgumentValue>> + Send,
{
    /// Creates a handler from an async function.
    #[must_use]
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> RouteHandler for FnRouteHandler<F>
where
    F: Fn(Vec<ArgumentValue>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ArgumentValue>> + Send,
{
    async fn call(&self, args: Vec<ArgumentValue>) -> anyhow::Result<ArgumentValue> {
        (self.func)(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fn_handler_receives_args_in_order() {
        let handler = FnRouteHandler::new(|args: Vec<ArgumentValue>| async move {
            let first = args.first().and_then(ArgumentValue::as_int).unwrap_or(0);
            Ok(ArgumentValue::Int(first * 2))
        });

        let result = handler
            .call(vec![ArgumentValue::Int(21), ArgumentValue::Null])
            .await
            .unwrap();
        assert!(matches!(result, ArgumentValue::Int(42)));
    }

    #[tokio::test]
    async fn test_fn_handler_error_propagates() {
        let handler = FnRouteHandler::new(|_args: Vec<ArgumentValue>| async move {
            Err(anyhow::anyhow!("boom"))
        });

        assert!(handler.call(Vec::new()).await.is_err());
    }
}
