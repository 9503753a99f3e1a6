//! Scene change notifications

use crate::bounds::BoundingBox;
use crate::derivative::{Quality, Usage};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Emitted by models as their displayed content changes
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// A different derivative is now displayed
    DerivativeChanged {
        model: Uuid,
        usage: Usage,
        quality: Quality,
    },
    /// The local bounding box of a model was replaced
    BoundingBoxChanged { model: Uuid, bounds: BoundingBox },
}

pub type EventSender = mpsc::UnboundedSender<SceneEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SceneEvent>;

/// Create a new event channel
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Send if a sender is present. A closed receiver is not an error.
pub(crate) fn emit(sender: Option<&EventSender>, event: SceneEvent) {
    if let Some(tx) = sender {
        let _ = tx.send(event);
    }
}
