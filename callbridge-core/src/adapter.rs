use crate::error::OpError;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::warn;

/// Completion callback handed to a callback-style operation: error-or-absent
/// first, result second.
pub type Callback = Box<dyn FnOnce(Option<OpError>, Value) + Send + 'static>;

/// A one-shot closure driving a single callback-style operation.
///
/// Returning `Err` before the callback has fired is the synchronous-failure
/// channel; once the callback has fired the return value no longer matters.
pub type CallbackOp = Box<dyn FnOnce(Callback) -> Result<(), OpError> + Send + 'static>;

/// Adapter seam between callback-style operations and futures. The patcher
/// accepts any implementation; [`OneshotAdapter`] is the default.
pub trait AdaptCallback: Send + Sync + std::fmt::Debug {
    fn adapt(&self, op: CallbackOp) -> OpFuture;
}

/// Transition-once settlement guard over the future's sender half.
///
/// pending → settled-ok | settled-err, exactly one transition; attempts after
/// the first find the sender gone and are logged and dropped.
#[derive(Debug, Clone)]
struct Settler {
    tx: Arc<Mutex<Option<oneshot::Sender<Result<Value, OpError>>>>>,
}

impl Settler {
    fn settle(&self, outcome: Result<Value, OpError>) {
        let mut slot = match self.tx.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        match slot.take() {
            // A dropped receiver means the caller abandoned the future; not
            // our error to report.
            Some(tx) => {
                let _ = tx.send(outcome);
            }
            None => warn!("settlement attempted after future already settled; ignoring"),
        }
    }
}

/// Single-settlement future for an adapted operation.
///
/// Resolves with the value the operation's callback reported, or rejects with
/// the error channel's payload. If the operation drops its callback without
/// ever settling, the future rejects with a canceled error rather than
/// hanging forever.
#[derive(Debug)]
pub struct OpFuture {
    rx: oneshot::Receiver<Result<Value, OpError>>,
}

impl OpFuture {
    fn channel() -> (Settler, OpFuture) {
        let (tx, rx) = oneshot::channel();
        let settler = Settler {
            tx: Arc::new(Mutex::new(Some(tx))),
        };
        (settler, OpFuture { rx })
    }

    /// A future already settled with `value`.
    pub fn resolved(value: Value) -> Self {
        let (settler, future) = Self::channel();
        settler.settle(Ok(value));
        future
    }

    /// A future already settled with `error`.
    pub fn rejected(error: OpError) -> Self {
        let (settler, future) = Self::channel();
        settler.settle(Err(error));
        future
    }
}

impl Future for OpFuture {
    type Output = Result<Value, OpError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(OpError::canceled(
                "operation dropped its callback without settling",
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Default [`AdaptCallback`] backed by a `tokio::sync::oneshot` channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneshotAdapter;

impl AdaptCallback for OneshotAdapter {
    fn adapt(&self, op: CallbackOp) -> OpFuture {
        adapt(op)
    }
}

/// Drive `op` synchronously and return a future settling with whatever its
/// callback reports. A truthy error rejects; anything else resolves with the
/// value. An `Err` returned by `op` itself rejects the future, unless the
/// callback already settled it, in which case the guard drops the late error.
pub fn adapt(op: CallbackOp) -> OpFuture {
    let (settler, future) = OpFuture::channel();
    let callback_settler = settler.clone();
    let callback: Callback = Box::new(move |error, value| match error {
        Some(err) => callback_settler.settle(Err(err)),
        None => callback_settler.settle(Ok(value)),
    });
    if let Err(err) = op(callback) {
        settler.settle(Err(err));
    }
    future
}
