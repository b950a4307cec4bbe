//! Multiplexed named part-event source.
//!
//! An [`UploadObserver`] fans discrete, named multipart data events out to
//! any number of subscribers. Each upload binder subscribes independently
//! and filters for the part name it is bound to; dropping a subscription is
//! cancellation.

use bytes::Bytes;
use mime::Mime;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// One discrete data event for a named multipart part.
///
/// A part may arrive as several events; the final event for a name carries
/// the `completed` flag.
#[derive(Debug, Clone)]
pub struct PartEvent {
    name: String,
    file_name: Option<String>,
    content_type: Option<Mime>,
    chunk: Bytes,
    file: bool,
    completed: bool,
}

impl PartEvent {
    /// Creates an event for a file part.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<Mime>,
        chunk: Bytes,
        completed: bool,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type,
            chunk,
            file: true,
            completed,
        }
    }

    /// Creates an event for a plain (non-file) attribute part.
    #[must_use]
    pub fn attribute(name: impl Into<String>, chunk: Bytes, completed: bool) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            content_type: None,
            chunk,
            file: false,
            completed,
        }
    }

    /// Returns the part name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the client file name, if the part is a file.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Returns the declared media type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&Mime> {
        self.content_type.as_ref()
    }

    /// Returns this event's chunk of data.
    #[must_use]
    pub fn chunk(&self) -> &Bytes {
        &self.chunk
    }

    /// Returns true if the part is a file upload.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.file
    }

    /// Returns true if this is the terminal event for the part.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

/// An item delivered to a part-event subscriber.
#[derive(Debug, Clone)]
pub enum PartFeed {
    /// A data event.
    Event(PartEvent),
    /// The part source failed; no further events will arrive.
    Error(String),
}

/// Fan-out publisher of part events for one request.
///
/// Publishing never blocks: each subscriber has an unbounded buffer and
/// drains at its own pace. Subscribers whose receiving half has been dropped
/// are pruned on the next publish.
#[derive(Debug, Clone, Default)]
pub struct UploadObserver {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<PartFeed>>>>,
}

impl UploadObserver {
    /// Creates a new observer with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber and returns its event receiver.
    #[must_use]
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<PartFeed> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Publishes a part event to all live subscribers.
    pub fn publish(&self, event: PartEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(PartFeed::Event(event.clone())).is_ok());
    }

    /// Signals a source failure to all live subscribers.
    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        self.subscribers
            .lock()
            .retain(|tx| tx.send(PartFeed::Error(message.clone())).is_ok());
    }

    /// Returns the number of subscribers still holding a live receiver.
    ///
    /// Dropped receivers are only pruned on publish, so this prunes first.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_fans_out_to_all_subscribers() {
        let observer = UploadObserver::new();
        let mut a = observer.subscribe();
        let mut b = observer.subscribe();

        observer.publish(PartEvent::attribute("field", Bytes::from_static(b"v"), true));

        assert!(matches!(a.recv().await, Some(PartFeed::Event(_))));
        assert!(matches!(b.recv().await, Some(PartFeed::Event(_))));
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_pruned() {
        let observer = UploadObserver::new();
        let first = observer.subscribe();
        let _second = observer.subscribe();
        assert_eq!(observer.subscriber_count(), 2);

        drop(first);
        assert_eq!(observer.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_error_is_delivered() {
        let observer = UploadObserver::new();
        let mut rx = observer.subscribe();

        observer.error("decode failed");
        match rx.recv().await {
            Some(PartFeed::Error(message)) => assert_eq!(message, "decode failed"),
            other => panic!("unexpected feed item: {other:?}"),
        }
    }

    #[test]
    fn test_part_event_accessors() {
        let event = PartEvent::file("doc", "a.pdf", Some(mime::APPLICATION_PDF), Bytes::new(), false);
        assert_eq!(event.name(), "doc");
        assert_eq!(event.file_name(), Some("a.pdf"));
        assert!(event.is_file());
        assert!(!event.is_completed());

        let attr = PartEvent::attribute("note", Bytes::from_static(b"hi"), true);
        assert!(!attr.is_file());
        assert!(attr.content_type().is_none());
        assert!(attr.is_completed());
    }
}
