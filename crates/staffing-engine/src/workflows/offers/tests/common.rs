use axum::body::to_bytes;
use axum::response::Response;
use serde_json::Value;

pub(super) use crate::workflows::fixtures::*;
use crate::workflows::notifications::{LifecycleEvent, NotificationError, NotificationSink};
use crate::workflows::offers::{DeclineReason, ResponseDetails};

pub(super) fn decline(is_valid: bool) -> ResponseDetails {
    ResponseDetails {
        reason: Some(DeclineReason {
            code: Some("too_far".to_string()),
            text: "Commute is too long".to_string(),
            is_valid,
        }),
        note: None,
    }
}

/// Sink whose transport is always down.
#[derive(Debug, Default)]
pub(super) struct OfflineSink;

impl NotificationSink for OfflineSink {
    fn publish(&self, _event: LifecycleEvent) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("push gateway offline".to_string()))
    }
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
