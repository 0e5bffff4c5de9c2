//! Streaming calendar upload.
//!
//! The upload is a single task with three kinds of suspension point:
//! sending the request, reading the error body of a rejected request, and
//! reading each body chunk. Each one also waits on a [`CancellationToken`].
//! Frames are decoded and applied strictly in arrival order before the next
//! chunk is requested.

use std::fmt;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use slotify_core::{
    FrameDecoder, FrameOutcome, ResponseHead, TriggerControl, TriggerGuard, UPLOAD_BUSY_LABEL,
    UploadFile, UploadLifecycle,
};

use crate::{Client, UPLOAD_PATH};

/// Multipart field carrying the calendar export.
const FILE_FIELD: &str = "file";

impl Client {
    /// Uploads a calendar export and follows its progress stream.
    ///
    /// Returns the lifecycle in its final state: `Idle` when no file was
    /// given, otherwise `Completed` or `Failed`. The trigger is disabled for
    /// the whole attempt and restored before this returns, whichever way the
    /// attempt ended. `on_progress` receives each progress message.
    pub async fn upload<F>(
        &self,
        file: Option<UploadFile>,
        trigger: &mut TriggerControl,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> UploadLifecycle
    where
        F: FnMut(&str),
    {
        let mut lifecycle = UploadLifecycle::new();
        let Some(file) = lifecycle.begin(file) else {
            return lifecycle;
        };
        let mut guard = match trigger.engage(UPLOAD_BUSY_LABEL) {
            Ok(guard) => guard,
            Err(err) => {
                lifecycle.fail(err);
                return lifecycle;
            }
        };

        info!(file = %file.file_name, bytes = file.content.len(), "uploading calendar");
        let form = Form::new().part(FILE_FIELD, Part::bytes(file.content).file_name(file.file_name));
        let send = self.http.post(self.url(UPLOAD_PATH)).multipart(form).send();

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                lifecycle.cancel();
                return lifecycle;
            }
            result = send => result,
        };
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                lifecycle.on_transport_error(err.to_string());
                return lifecycle;
            }
        };

        let head = ResponseHead {
            status: response.status().as_u16(),
            content_type: response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
        };
        debug!(status = head.status, content_type = ?head.content_type, "upload response");

        if head.is_rejection() {
            let body = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    lifecycle.cancel();
                    return lifecycle;
                }
                body = response.text() => body.unwrap_or_default(),
            };
            lifecycle.on_rejected(head.status, &body);
            return lifecycle;
        }

        lifecycle.on_stream_opened();
        drive_stream(
            response.bytes_stream(),
            &mut lifecycle,
            &mut guard,
            cancel,
            on_progress,
        )
        .await;
        lifecycle
    }
}

/// Feeds body chunks through a [`FrameDecoder`] into `lifecycle` until it
/// terminates, the body ends, or `cancel` fires.
///
/// Progress messages are mirrored onto the trigger label. An unterminated
/// remainder at end of stream is discarded.
pub async fn drive_stream<S, E, F>(
    stream: S,
    lifecycle: &mut UploadLifecycle,
    trigger: &mut TriggerGuard<'_>,
    cancel: &CancellationToken,
    mut on_progress: F,
) where
    S: Stream<Item = Result<Bytes, E>>,
    E: fmt::Display,
    F: FnMut(&str),
{
    let mut stream = std::pin::pin!(stream);
    let mut decoder = FrameDecoder::new();

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                lifecycle.cancel();
                return;
            }
            next = stream.next() => next,
        };

        let chunk = match next {
            Some(Ok(chunk)) => chunk,
            Some(Err(err)) => {
                lifecycle.on_transport_error(err.to_string());
                return;
            }
            None => {
                let dropped = decoder.finish();
                if dropped > 0 {
                    debug!(dropped, "discarding unterminated frame remainder");
                }
                lifecycle.on_end_of_stream();
                return;
            }
        };

        for frame in decoder.feed(&chunk) {
            if lifecycle.on_frame(&frame) == FrameOutcome::Progress {
                trigger.set_label(lifecycle.message());
                on_progress(lifecycle.message());
            }
            if lifecycle.is_terminal() {
                return;
            }
        }
    }
}
