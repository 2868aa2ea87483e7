//! Consumer side of repository discovery

use crate::error::{RegistryError, Result};
use futures::Stream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Repository names as they are discovered, followed by at most one error.
///
/// The name conduit closes when discovery finishes, fails or is cancelled.
/// A terminal error, if any, is yielded after the last name.
pub struct RepositoryStream {
    names: mpsc::Receiver<String>,
    errors: oneshot::Receiver<RegistryError>,
    cancel: CancellationToken,
    finished: bool,
}

impl RepositoryStream {
    pub(crate) fn new(
        names: mpsc::Receiver<String>,
        errors: oneshot::Receiver<RegistryError>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            names,
            errors,
            cancel,
            finished: false,
        }
    }

    /// Next repository name, the terminal error, or `None` once discovery is over
    pub async fn next(&mut self) -> Option<Result<String>> {
        if self.finished {
            return None;
        }
        if self.cancel.is_cancelled() {
            self.finished = true;
            return None;
        }

        if let Some(name) = self.names.recv().await {
            return Some(Ok(name));
        }

        // finished only once the error slot has resolved
        let outcome = (&mut self.errors).await;
        self.finished = true;
        match outcome {
            Ok(err) => Some(Err(err)),
            Err(_) => None,
        }
    }

    /// Stop discovery; the producer issues no further requests
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Raw name conduit, error conduit and cancellation signal
    pub fn into_parts(
        self,
    ) -> (
        mpsc::Receiver<String>,
        oneshot::Receiver<RegistryError>,
        CancellationToken,
    ) {
        (self.names, self.errors, self.cancel)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<String>> + Send {
        futures::stream::unfold(self, |mut stream| async move {
            stream.next().await.map(|item| (item, stream))
        })
    }

    /// Collect every name. On error the partial listing is discarded.
    pub async fn collect(mut self) -> Result<Vec<String>> {
        let mut repositories = Vec::with_capacity(10);
        while let Some(item) = self.next().await {
            repositories.push(item?);
        }
        Ok(repositories)
    }
}
