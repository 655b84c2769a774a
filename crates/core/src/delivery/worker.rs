//! Delivery queue, worker, and ticket.

use std::sync::Arc;

use bytes::Bytes;
use parcel_shared::{SessionId, WidgetIdentity};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::provider::{Credential, DeliverySink, ProviderError};
use crate::staging::StagingArea;
use crate::upload::{UploadFile, Visitor};

/// Everything needed to deliver a committed session.
#[derive(Debug, Clone)]
pub struct DeliveryJob {
    /// Owning widget.
    pub widget: WidgetIdentity,
    /// Committed session.
    pub session_id: SessionId,
    /// Submitting visitor.
    pub visitor: Visitor,
    /// Provider credential captured at commit time.
    pub credential: Credential,
    /// Selected files.
    pub files: Vec<UploadFile>,
}

/// A file together with its staged bytes.
#[derive(Debug, Clone)]
pub struct StagedContent {
    /// File record.
    pub file: UploadFile,
    /// File bytes read from the staging area.
    pub content: Bytes,
}

/// A job with its bytes loaded, as handed to the sink.
#[derive(Debug, Clone)]
pub struct DeliveryBundle {
    /// Owning widget.
    pub widget: WidgetIdentity,
    /// Committed session.
    pub session_id: SessionId,
    /// Submitting visitor.
    pub visitor: Visitor,
    /// Provider credential.
    pub credential: Credential,
    /// Files with content.
    pub files: Vec<StagedContent>,
}

/// Handle for enqueuing delivery jobs.
#[derive(Debug, Clone)]
pub struct DeliveryQueue {
    tx: mpsc::UnboundedSender<DeliveryJob>,
}

impl DeliveryQueue {
    /// Start the delivery worker.
    ///
    /// The worker stops once every queue handle has been dropped and the
    /// backlog is drained.
    #[must_use]
    pub fn start<S>(sink: Arc<S>, staging: Arc<StagingArea>) -> (Self, JoinHandle<()>)
    where
        S: DeliverySink + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<DeliveryJob>();

        let handle = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let sink = Arc::clone(&sink);
                let staging = Arc::clone(&staging);
                tokio::spawn(async move {
                    run_job(sink.as_ref(), staging.as_ref(), job).await;
                });
            }
            debug!("Delivery worker stopped");
        });

        (Self { tx }, handle)
    }

    /// Wrap a job in a ticket bound to this queue.
    #[must_use]
    pub fn ticket(&self, job: DeliveryJob) -> DeliveryTicket {
        DeliveryTicket {
            job: Some(job),
            queue: self.clone(),
        }
    }

    fn enqueue(&self, job: DeliveryJob) {
        let session_id = job.session_id;
        if self.tx.send(job).is_err() {
            error!(session_id = %session_id, "Delivery worker is gone, bundle dropped");
        }
    }
}

/// A pending delivery that is enqueued exactly once.
///
/// Call [`DeliveryTicket::dispatch`] after the response is sent. A ticket that
/// is dropped without being dispatched enqueues its job anyway, since the
/// session is already committed.
#[derive(Debug)]
pub struct DeliveryTicket {
    job: Option<DeliveryJob>,
    queue: DeliveryQueue,
}

impl DeliveryTicket {
    /// Session the ticket belongs to.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.job.as_ref().map(|job| job.session_id)
    }

    /// Enqueue the job.
    pub fn dispatch(mut self) {
        if let Some(job) = self.job.take() {
            self.queue.enqueue(job);
        }
    }
}

impl Drop for DeliveryTicket {
    fn drop(&mut self) {
        if let Some(job) = self.job.take() {
            warn!(session_id = %job.session_id, "Delivery ticket dropped before dispatch");
            self.queue.enqueue(job);
        }
    }
}

async fn load_bundle(
    staging: &StagingArea,
    job: DeliveryJob,
) -> Result<DeliveryBundle, ProviderError> {
    let mut files = Vec::with_capacity(job.files.len());
    for file in job.files {
        let content = staging.read(&file.storage_ref).await?;
        files.push(StagedContent { file, content });
    }

    Ok(DeliveryBundle {
        widget: job.widget,
        session_id: job.session_id,
        visitor: job.visitor,
        credential: job.credential,
        files,
    })
}

async fn run_job<S: DeliverySink>(sink: &S, staging: &StagingArea, job: DeliveryJob) {
    let session_id = job.session_id;
    let instance_id = job.widget.instance_id.clone();

    let bundle = match load_bundle(staging, job).await {
        Ok(bundle) => bundle,
        Err(e) => {
            error!(
                session_id = %session_id,
                instance_id = %instance_id,
                error = %e,
                "Failed to load staged bundle"
            );
            return;
        }
    };

    match sink.deliver(&bundle).await {
        Ok(report) => {
            info!(
                session_id = %session_id,
                instance_id = %instance_id,
                files = report.remote_ids.len(),
                folder_id = report.folder_id.as_deref().unwrap_or("-"),
                "Bundle delivered"
            );
            for staged in &bundle.files {
                staging.release_best_effort(&staged.file.storage_ref).await;
            }
        }
        Err(e) => {
            error!(
                session_id = %session_id,
                instance_id = %instance_id,
                error = %e,
                "Bundle delivery failed, staged files kept"
            );
        }
    }
}
