//! Shared handle over a stream of converted body elements.

use crate::argument::ArgumentValue;
use crate::binding::BindError;
use futures_core::Stream;
use futures_util::StreamExt;
use parking_lot::Mutex;
use std::pin::Pin;
use std::sync::Arc;

/// Item type produced by a body element stream.
pub type ElementResult = Result<ArgumentValue, BindError>;

type BoxElementStream = Pin<Box<dyn Stream<Item = ElementResult> + Send>>;

/// A single-consumer stream of body elements, bound as an argument value.
///
/// The stream itself is the bound value; its elements arrive later, at the
/// consumer's pace. Cloning shares the handle; the first caller to
/// [`BodyStream::take`] owns the element stream.
#[derive(Clone)]
pub struct BodyStream {
    inner: Arc<Mutex<Option<BoxElementStream>>>,
}

impl BodyStream {
    /// Wraps an element stream into a shareable handle.
    #[must_use]
    pub fn new(stream: impl Stream<Item = ElementResult> + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(Box::pin(stream)))),
        }
    }

    /// Takes the element stream out of the handle.
    ///
    /// Returns `None` if it was already taken.
    #[must_use]
    pub fn take(&self) -> Option<impl Stream<Item = ElementResult> + Send> {
        self.inner.lock().take()
    }

    /// Drains the stream, collecting all elements or the first error.
    pub async fn collect(&self) -> Result<Vec<ArgumentValue>, BindError> {
        let Some(mut stream) = self.take() else {
            return Ok(Vec::new());
        };
        let mut elements = Vec::new();
        while let Some(item) = stream.next().await {
            elements.push(item?);
        }
        Ok(elements)
    }
}

impl std::fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyStream")
            .field("taken", &self.inner.lock().is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_elements() {
        let stream = futures_util::stream::iter(vec![
            Ok(ArgumentValue::Int(1)),
            Ok(ArgumentValue::Int(2)),
        ]);
        let body = BodyStream::new(stream);

        let elements = body.collect().await.unwrap();
        assert_eq!(elements.len(), 2);
    }

    #[tokio::test]
    async fn test_take_is_single_consumer() {
        let body = BodyStream::new(futures_util::stream::empty());
        assert!(body.take().is_some());
        assert!(body.take().is_none());
    }

    #[tokio::test]
    async fn test_collect_surfaces_error() {
        let arg = crate::Argument::new("body", crate::TypeSpec::Json);
        let stream = futures_util::stream::iter(vec![
            Ok(ArgumentValue::Int(1)),
            Err(BindError::unsatisfied(&arg)),
        ]);
        let body = BodyStream::new(stream);

        assert!(body.collect().await.is_err());
    }
}
