use super::printer::StreamPrinter;
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::core::manager::{
    ConversationManager, SendRejection, REQUEST_ERROR_MESSAGE, STREAM_INTERRUPTED_MARKER,
};
use crate::core::session::SessionContext;
use crate::core::store::KeyValueStore;
use crate::ui::render::{render_error, render_notice};
use crate::ui::theme::Theme;
use std::future::Future;
use std::io::{self, Write};
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Completed,
    Failed(String),
    Cancelled,
    Rejected(SendRejection),
}

/// Stream pump shared by every exchange of one chat session.
pub struct StreamChannel {
    service: ChatStreamService,
    rx: mpsc::UnboundedReceiver<(StreamMessage, u64)>,
}

impl StreamChannel {
    pub fn new() -> Self {
        let (service, rx) = ChatStreamService::new();
        Self { service, rx }
    }
}

impl Default for StreamChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Send one prompt and stream the reply to `out` until it ends, fails, or
/// `interrupt` resolves.
///
/// Messages left over from an earlier, cancelled stream are drained through
/// the manager, which rejects them by stream id.
#[allow(clippy::too_many_arguments)]
pub async fn run_exchange<S, W, F>(
    manager: &mut ConversationManager<S>,
    session: &SessionContext,
    channel: &mut StreamChannel,
    input: &str,
    theme: &Theme,
    syntax: bool,
    out: &mut W,
    interrupt: F,
) -> io::Result<ExchangeOutcome>
where
    S: KeyValueStore,
    W: Write,
    F: Future<Output = ()>,
{
    let ticket = match manager.begin_send(input) {
        Ok(ticket) => ticket,
        Err(rejection) => return Ok(ExchangeOutcome::Rejected(rejection)),
    };
    let current = ticket.stream_id;
    channel
        .service
        .spawn_stream(session.build_stream_params(&ticket));

    let mut printer = StreamPrinter::new(theme, syntax);
    let mut failure: Option<String> = None;
    tokio::pin!(interrupt);

    let outcome = loop {
        tokio::select! {
            received = channel.rx.recv() => {
                let Some((message, stream_id)) = received else {
                    break ExchangeOutcome::Cancelled;
                };
                match message {
                    StreamMessage::Chunk(fragment) => {
                        if manager.apply_chunk(stream_id, &fragment) {
                            printer.push(&fragment, out)?;
                        }
                    }
                    StreamMessage::Error(detail) => {
                        if manager.fail_stream(stream_id, &detail) {
                            failure = Some(detail);
                        }
                    }
                    StreamMessage::End => {
                        manager.finish_stream(stream_id);
                        if stream_id == current {
                            break match failure.take() {
                                Some(detail) => ExchangeOutcome::Failed(detail),
                                None => ExchangeOutcome::Completed,
                            };
                        }
                        debug!(stream_id, "Ignoring end of stale stream");
                    }
                }
            }
            _ = &mut interrupt => {
                manager.cancel_stream();
                break ExchangeOutcome::Cancelled;
            }
        }
    };

    printer.finish(out)?;
    let partial = printer.wrote_any();
    match &outcome {
        ExchangeOutcome::Failed(detail) => {
            let notice = if partial {
                STREAM_INTERRUPTED_MARKER
            } else {
                REQUEST_ERROR_MESSAGE
            };
            writeln!(out, "{}", render_error(notice, theme))?;
            writeln!(out, "{}", render_notice(&format!("({detail})"), theme))?;
        }
        ExchangeOutcome::Cancelled => {
            writeln!(out, "{}", render_notice("[stopped]", theme))?;
        }
        ExchangeOutcome::Completed | ExchangeOutcome::Rejected(_) => {}
    }
    out.flush()?;
    Ok(outcome)
}
