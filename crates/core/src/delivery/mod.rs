//! Background delivery of committed bundles.
//!
//! A commit produces a [`DeliveryTicket`]. The HTTP layer holds the ticket
//! until the response body is finished and then dispatches it onto the
//! [`DeliveryQueue`]. The worker behind the queue runs every job on its own
//! task, so a slow provider never blocks the next bundle and a dropped request
//! never cancels a dispatched one. Outcomes are only logged.

mod worker;

pub use worker::{DeliveryBundle, DeliveryJob, DeliveryQueue, DeliveryTicket, StagedContent};
