//! Streaming body binder.
//!
//! Turns the raw byte-chunk stream of the request body into a consumable
//! element stream of the argument's declared element type. The adapter is
//! pull-based: downstream demand is relayed structurally (each downstream
//! poll drives at most one upstream poll, except when skipping empty
//! chunks), and cancellation is dropping the upstream stream.

use crate::binder::{ArgumentBinder, BinderKind};
use crate::request::{ChunkResult, ServerRequest};
use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use hermes_core::{
    Argument, ArgumentValue, BindError, BindingResult, BodyStream, ConversionContext,
    ConversionService, ElementResult, TypeSpec,
};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Binds a streaming body argument to an element stream.
///
/// The stream itself is the bound value, so the binding result is
/// immediately satisfied; the elements arrive later, at the consumer's pace.
pub struct StreamBodyBinder {
    conversion: Arc<dyn ConversionService>,
}

impl StreamBodyBinder {
    /// Creates a streaming body binder.
    #[must_use]
    pub fn new(conversion: Arc<dyn ConversionService>) -> Self {
        Self { conversion }
    }
}

impl ArgumentBinder for StreamBodyBinder {
    fn kind(&self) -> BinderKind {
        BinderKind::NonBlockingBody
    }

    fn bind(&self, ctx: &mut ConversionContext, request: &Arc<ServerRequest>) -> BindingResult {
        let argument = ctx.argument().clone();
        let element_spec = argument
            .type_spec()
            .type_param()
            .cloned()
            .unwrap_or(TypeSpec::Json);

        let upstream: Pin<Box<dyn Stream<Item = ChunkResult> + Send>> =
            if let Some(chunks) = request.take_chunks() {
                Box::pin(chunks)
            } else if let Some(bytes) = request.body_bytes() {
                // Already-buffered bodies are exposed as a single chunk.
                Box::pin(futures_util::stream::once({
                    let bytes = bytes.clone();
                    async move { Ok(bytes) }
                }))
            } else {
                return BindingResult::unsatisfied();
            };

        let stream = ConvertingBodyStream {
            upstream: Some(upstream),
            element: Argument::new(argument.name(), element_spec),
            argument,
            conversion: Arc::clone(&self.conversion),
        };
        BindingResult::satisfied(ArgumentValue::Stream(BodyStream::new(stream)))
    }
}

struct ConvertingBodyStream {
    /// None once the upstream has terminated or been cancelled.
    upstream: Option<Pin<Box<dyn Stream<Item = ChunkResult> + Send>>>,
    argument: Argument,
    element: Argument,
    conversion: Arc<dyn ConversionService>,
}

impl ConvertingBodyStream {
    fn convert_chunk(&self, chunk: Bytes) -> Result<ArgumentValue, BindError> {
        let mut ctx = ConversionContext::of(&self.element);
        match self
            .conversion
            .convert(ArgumentValue::Bytes(chunk), &self.element, &mut ctx)
        {
            Some(value) => Ok(value),
            None => match ctx.take_last_error() {
                Some(error) => {
                    tracing::debug!(
                        argument = self.argument.name(),
                        error = %error,
                        "cannot convert streamed chunk"
                    );
                    Err(BindError::conversion(&self.argument, error))
                }
                None => Err(BindError::unsatisfied(&self.argument)),
            },
        }
    }
}

impl Stream for ConvertingBodyStream {
    type Item = ElementResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            let Some(upstream) = self.upstream.as_mut() else {
                return Poll::Ready(None);
            };
            match upstream.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(None) => {
                    self.upstream = None;
                    return Poll::Ready(None);
                }
                Poll::Ready(Some(Err(e))) => {
                    // Cancel before surfacing the failure so nothing is
                    // delivered after a terminal event.
                    self.upstream = None;
                    return Poll::Ready(Some(Err(BindError::upstream(&self.argument, e))));
                }
                Poll::Ready(Some(Ok(chunk))) => {
                    if chunk.is_empty() {
                        // Skip and pull one more.
                        continue;
                    }
                    tracing::trace!(
                        argument = self.argument.name(),
                        len = chunk.len(),
                        "received streaming chunk"
                    );
                    match self.convert_chunk(chunk) {
                        Ok(value) => return Poll::Ready(Some(Ok(value))),
                        Err(error) => {
                            self.upstream = None;
                            return Poll::Ready(Some(Err(error)));
                        }
                    }
                }
            }
        }
    }
}
