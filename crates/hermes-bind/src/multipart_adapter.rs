//! Adapter from a buffered `multipart/form-data` body to part events.
//!
//! Drives the low-level decoder over an already-buffered body and publishes
//! the resulting [`PartEvent`]s to an [`UploadObserver`], so the upload
//! binders can be exercised end-to-end without a live transport pipeline.

use crate::observer::{PartEvent, UploadObserver};
use bytes::Bytes;
use http::{header, HeaderMap};
use std::io;
use thiserror::Error;

/// Default maximum total body size for multipart (50 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 50 * 1024 * 1024;

/// Limits applied while decoding a multipart body.
#[derive(Debug, Clone)]
pub struct MultipartLimits {
    /// Maximum total body size in bytes.
    pub max_body_size: usize,
    /// Maximum number of parts allowed.
    pub max_parts: usize,
}

impl Default for MultipartLimits {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            max_parts: 100,
        }
    }
}

/// A multipart decoding failure.
#[derive(Debug, Error)]
pub enum MultipartError {
    /// The Content-Type header is missing or not readable.
    #[error("missing or unreadable Content-Type header")]
    MissingContentType,

    /// The Content-Type header carries no usable boundary.
    #[error("missing or invalid boundary in multipart Content-Type")]
    InvalidBoundary,

    /// The body exceeds the configured size limit.
    #[error("payload too large: max {max} bytes, got {actual} bytes")]
    PayloadTooLarge {
        /// The configured maximum.
        max: usize,
        /// The observed size.
        actual: usize,
    },

    /// More parts arrived than the configured limit allows.
    #[error("too many parts (max {max})")]
    TooManyParts {
        /// The configured maximum.
        max: usize,
    },

    /// The decoder rejected the body.
    #[error("multipart decode error: {0}")]
    Decode(#[from] multer::Error),
}

/// Decodes a buffered multipart body and publishes its parts as events.
///
/// Every decoded part is published as a single terminal event. Decoding
/// failures are signalled to subscribers via the observer's error channel
/// and returned to the caller.
pub async fn publish_multipart(
    observer: &UploadObserver,
    headers: &HeaderMap,
    body: Bytes,
    limits: &MultipartLimits,
) -> Result<usize, MultipartError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or(MultipartError::MissingContentType)?;
    let boundary =
        multer::parse_boundary(content_type).map_err(|_| MultipartError::InvalidBoundary)?;

    if body.len() > limits.max_body_size {
        return Err(MultipartError::PayloadTooLarge {
            max: limits.max_body_size,
            actual: body.len(),
        });
    }

    let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut published = 0usize;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                observer.error(format!("multipart decode error: {e}"));
                return Err(e.into());
            }
        };
        if published >= limits.max_parts {
            let err = MultipartError::TooManyParts {
                max: limits.max_parts,
            };
            observer.error(err.to_string());
            return Err(err);
        }

        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().cloned();
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                observer.error(format!("multipart decode error: {e}"));
                return Err(e.into());
            }
        };

        let event = match file_name {
            Some(file_name) => PartEvent::file(name, file_name, content_type, data, true),
            None => PartEvent::attribute(name, data, true),
        };
        observer.publish(event);
        published += 1;
    }

    Ok(published)
}
