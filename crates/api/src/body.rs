//! Response body that dispatches a delivery once it has been written.

use std::pin::Pin;
use std::task::{Context, Poll};

use http_body::{Body, Frame, SizeHint};
use parcel_core::delivery::DeliveryTicket;
use pin_project::pin_project;
use tracing::debug;

/// Wraps a body and dispatches its ticket when the last frame is produced.
///
/// If the body is dropped first (client gone, connection reset), the ticket's
/// own drop enqueues the job, so a committed session is always delivered.
#[pin_project]
#[derive(Debug)]
pub struct DispatchOnEnd<B> {
    #[pin]
    inner: B,
    ticket: Option<DeliveryTicket>,
}

impl<B> DispatchOnEnd<B> {
    /// Attach a ticket to a body.
    pub fn new(inner: B, ticket: DeliveryTicket) -> Self {
        Self {
            inner,
            ticket: Some(ticket),
        }
    }
}

fn dispatch(ticket: &mut Option<DeliveryTicket>) {
    if let Some(ticket) = ticket.take() {
        debug!(session_id = ?ticket.session_id(), "Response written, dispatching delivery");
        ticket.dispatch();
    }
}

impl<B: Body> Body for DispatchOnEnd<B> {
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();
        let polled = this.inner.as_mut().poll_frame(cx);

        match &polled {
            Poll::Ready(None) => dispatch(this.ticket),
            Poll::Ready(Some(Ok(_))) if this.inner.is_end_stream() => dispatch(this.ticket),
            _ => {}
        }

        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
