use std::error::Error as StdError;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::models::{Check, Outcome};

/// Prober trait: one bounded network call per check, one outcome per call
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, check: &Check) -> Outcome;
}

/// Write-once cell for a probe's outcome.
///
/// The response, the transport error and the deadline all race to fill it;
/// the first [`deliver`](Self::deliver) wins and every later one is discarded.
#[derive(Clone)]
pub struct OutcomeSlot {
    sender: Arc<Mutex<Option<oneshot::Sender<Outcome>>>>,
}

impl OutcomeSlot {
    pub fn new() -> (Self, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        (Self { sender: Arc::new(Mutex::new(Some(tx))) }, rx)
    }

    /// Returns `true` only for the call that claimed the slot
    pub fn deliver(&self, outcome: Outcome) -> bool {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner).take();
        match sender {
            Some(tx) => {
                // A dropped receiver means the probe was abandoned; the slot is
                // still consumed.
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }
}

/// Aborts the racing tasks once the probe is done or dropped
struct Racers(Vec<JoinHandle<()>>);

impl Drop for Racers {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// HTTP/HTTPS prober
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    /// Redirects are reported as plain status codes and never followed.
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Prober for HttpProber {
    async fn probe(&self, check: &Check) -> Outcome {
        let deadline = Duration::from_secs(check.timeout_seconds);
        let request = self.client.request(check.method.as_reqwest(), check.target());
        let (slot, delivered) = OutcomeSlot::new();

        let response = {
            let slot = slot.clone();
            tokio::spawn(async move {
                let outcome = match request.send().await {
                    Ok(response) => Outcome::response(response.status().as_u16()),
                    Err(e) if e.is_timeout() => Outcome::timeout(error_chain(&e)),
                    Err(e) => Outcome::transport(error_chain(&e)),
                };
                slot.deliver(outcome);
            })
        };
        let timer = tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            slot.deliver(Outcome::timeout(format!(
                "no response within {}s",
                deadline.as_secs()
            )));
        });
        let _racers = Racers(vec![response, timer]);

        delivered
            .await
            .unwrap_or_else(|_| Outcome::transport("probe task ended without an outcome"))
    }
}

/// `reqwest` hides the useful part (DNS, refused, TLS) in the source chain
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
