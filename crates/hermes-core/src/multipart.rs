//! Multipart upload value types.
//!
//! [`PartData`] is one discrete chunk of a named multipart part.
//! [`StreamingFileUpload`] is the handle bound to a streaming upload
//! argument: it resolves as soon as the first chunk of its part arrives,
//! while subsequent chunks continue to flow onto its channel with an
//! independent lifetime. [`CompletedFileUpload`] is the fully buffered
//! variant.

use bytes::{Bytes, BytesMut};
use mime::Mime;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::Mutex;

/// One chunk of data for a named multipart part.
///
/// The content type is present only when the underlying part declared a
/// media type.
#[derive(Debug, Clone)]
pub struct PartData {
    content_type: Option<Mime>,
    data: Bytes,
}

impl PartData {
    /// Creates a new part data chunk.
    #[must_use]
    pub fn new(data: Bytes, content_type: Option<Mime>) -> Self {
        Self { content_type, data }
    }

    /// Returns the declared media type of the part, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&Mime> {
        self.content_type.as_ref()
    }

    /// Returns the chunk bytes.
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Consumes the chunk and returns its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Returns the chunk size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the chunk is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Sending half of a streaming upload's chunk channel.
pub type PartSender = mpsc::UnboundedSender<PartData>;

/// A handle to a file upload whose chunks are still arriving.
///
/// The handle becomes available to the handler as soon as the first chunk of
/// the matching part is seen; the chunk channel is consumed independently,
/// at the handler's own pace. Cloning shares the channel — the data remains
/// single-consumer.
#[derive(Debug, Clone)]
pub struct StreamingFileUpload {
    name: String,
    file_name: Option<String>,
    content_type: Option<Mime>,
    parts: Arc<Mutex<mpsc::UnboundedReceiver<PartData>>>,
}

impl StreamingFileUpload {
    /// Creates a streaming upload handle over an existing chunk receiver.
    ///
    /// Used when the channel must exist before the upload identity is known,
    /// so that no chunk observed before resolution is lost.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        file_name: Option<String>,
        content_type: Option<Mime>,
        receiver: mpsc::UnboundedReceiver<PartData>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name,
            content_type,
            parts: Arc::new(Mutex::new(receiver)),
        }
    }

    /// Creates a new streaming upload handle bound to a fresh chunk channel.
    ///
    /// Returns the handle together with the sender used to feed it.
    #[must_use]
    pub fn channel(
        name: impl Into<String>,
        file_name: Option<String>,
        content_type: Option<Mime>,
    ) -> (Self, PartSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(name, file_name, content_type, rx), tx)
    }

    /// Returns the form field name of the part.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the original file name from the client, if present.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Returns the declared media type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&Mime> {
        self.content_type.as_ref()
    }

    /// Receives the next chunk, or `None` once the part has completed.
    pub async fn next_part(&self) -> Option<PartData> {
        self.parts.lock().await.recv().await
    }

    /// Drains all remaining chunks into a [`CompletedFileUpload`].
    pub async fn collect(&self) -> CompletedFileUpload {
        let mut buf = BytesMut::new();
        while let Some(part) = self.next_part().await {
            buf.extend_from_slice(part.bytes());
        }
        CompletedFileUpload::new(
            self.name.clone(),
            self.file_name.clone(),
            self.content_type.clone(),
            buf.freeze(),
        )
    }
}

/// A file upload whose content has been fully buffered.
#[derive(Debug, Clone)]
pub struct CompletedFileUpload {
    name: String,
    file_name: Option<String>,
    content_type: Option<Mime>,
    data: Bytes,
}

impl CompletedFileUpload {
    /// Creates a new completed upload.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        file_name: Option<String>,
        content_type: Option<Mime>,
        data: Bytes,
    ) -> Self {
        Self {
            name: name.into(),
            file_name,
            content_type,
            data,
        }
    }

    /// Returns the form field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the original file name from the client, if present.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Returns the declared media type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&Mime> {
        self.content_type.as_ref()
    }

    /// Returns the upload content.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Returns the upload size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the upload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the file extension from the file name, if any.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.file_name
            .as_ref()
            .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_data_accessors() {
        let part = PartData::new(Bytes::from_static(b"abc"), Some(mime::TEXT_PLAIN));
        assert_eq!(part.len(), 3);
        assert!(!part.is_empty());
        assert_eq!(part.content_type(), Some(&mime::TEXT_PLAIN));
        assert_eq!(&part.into_bytes()[..], b"abc");
    }

    #[tokio::test]
    async fn test_streaming_upload_receives_chunks_in_order() {
        let (upload, tx) = StreamingFileUpload::channel("file", Some("a.txt".into()), None);

        tx.send(PartData::new(Bytes::from_static(b"one"), None)).unwrap();
        tx.send(PartData::new(Bytes::from_static(b"two"), None)).unwrap();
        drop(tx);

        assert_eq!(&upload.next_part().await.unwrap().into_bytes()[..], b"one");
        assert_eq!(&upload.next_part().await.unwrap().into_bytes()[..], b"two");
        assert!(upload.next_part().await.is_none());
    }

    #[tokio::test]
    async fn test_streaming_upload_collect() {
        let (upload, tx) =
            StreamingFileUpload::channel("file", Some("a.bin".into()), Some(mime::APPLICATION_OCTET_STREAM));

        tx.send(PartData::new(Bytes::from_static(b"he"), None)).unwrap();
        tx.send(PartData::new(Bytes::from_static(b"llo"), None)).unwrap();
        drop(tx);

        let completed = upload.collect().await;
        assert_eq!(completed.name(), "file");
        assert_eq!(completed.file_name(), Some("a.bin"));
        assert_eq!(&completed.data()[..], b"hello");
        assert_eq!(completed.extension(), Some("bin"));
    }

    #[tokio::test]
    async fn test_clone_shares_channel() {
        let (upload, tx) = StreamingFileUpload::channel("file", None, None);
        let other = upload.clone();

        tx.send(PartData::new(Bytes::from_static(b"x"), None)).unwrap();
        drop(tx);

        // Whichever handle polls first sees the chunk; the channel closes for both.
        assert_eq!(&other.next_part().await.unwrap().into_bytes()[..], b"x");
        assert!(upload.next_part().await.is_none());
    }

    #[test]
    fn test_completed_upload_no_extension() {
        let upload = CompletedFileUpload::new("f", Some("README".into()), None, Bytes::new());
        assert_eq!(upload.extension(), None);
        assert!(upload.is_empty());
    }
}
