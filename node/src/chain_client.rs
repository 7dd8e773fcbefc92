use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use head::PostChainTx;
use ledger::Ledger;

/// Seam for handing lifecycle transaction requests to a base-chain
/// submitter. Turning the request into a signed base-ledger transaction
/// (and getting it into a block) is the submitter's business.
#[async_trait]
pub trait ChainClient<L: Ledger>: Send + 'static {
    /// Hands one post request to the submitter.
    async fn post(&mut self, request: PostChainTx<L>) -> Result<(), ChainClientError>;
}

/// Submission failures. Fatal to the node: an unposted close or contest is
/// a safety problem, not an inconvenience.
#[derive(Debug, Error)]
pub enum ChainClientError {
    /// The request could not be handed over.
    #[error("Chain transaction submission failed: {0}")]
    SubmissionFailed(String),
}

/// Chain client forwarding requests into a channel, for an external
/// submitter task (or a simulated chain in tests).
pub struct ChannelChain<L: Ledger> {
    sender: mpsc::Sender<PostChainTx<L>>,
}

/// Creates a channel-backed chain client plus the receiving end for the
/// submitter.
pub fn post_channel<L: Ledger>(
    capacity: usize,
) -> (ChannelChain<L>, mpsc::Receiver<PostChainTx<L>>) {
    let (sender, receiver) = mpsc::channel(capacity);
    (ChannelChain { sender }, receiver)
}

#[async_trait]
impl<L: Ledger> ChainClient<L> for ChannelChain<L> {
    async fn post(&mut self, request: PostChainTx<L>) -> Result<(), ChainClientError> {
        self.sender
            .send(request)
            .await
            .map_err(|e| ChainClientError::SubmissionFailed(e.to_string()))
    }
}
