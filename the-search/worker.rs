use std::thread::JoinHandle;

use crossbeam::channel::{
  self,
  Receiver,
};
use the_lib::cancel::CancelToken;

use crate::{
  Hits,
  SearchHit,
  SearchSummary,
  Truncation,
};

/// Hits buffered between the worker and the consumer.
const CHANNEL_CAPACITY: usize = 256;

/// A tree search running on its own thread.
///
/// Hits arrive in the same order a synchronous scan yields them. The worker
/// blocks while the channel is full, so a slow consumer throttles the scan.
pub struct SearchHandle {
  hits:   Receiver<SearchHit>,
  cancel: CancelToken,
  worker: JoinHandle<SearchSummary>,
}

pub(crate) fn spawn(mut hits: Hits) -> SearchHandle {
  let cancel = hits.cancel.clone();
  let (tx, rx) = channel::bounded(CHANNEL_CAPACITY);
  let worker = std::thread::spawn(move || {
    let abandoned = hits.by_ref().any(|hit| tx.send(hit).is_err());
    if abandoned {
      // Receiver is gone, nobody wants the rest.
      hits.finish(Some(Truncation::Cancelled));
    }
    hits.into_summary()
  });

  SearchHandle {
    hits: rx,
    cancel,
    worker,
  }
}

impl SearchHandle {
  /// Blocks for each hit until the scan ends.
  pub fn iter(&self) -> channel::Iter<'_, SearchHit> {
    self.hits.iter()
  }

  /// Hits that have already arrived.
  pub fn try_iter(&self) -> channel::TryIter<'_, SearchHit> {
    self.hits.try_iter()
  }

  pub fn receiver(&self) -> &Receiver<SearchHit> {
    &self.hits
  }

  pub fn cancel(&self) {
    self.cancel.cancel();
  }

  pub fn is_finished(&self) -> bool {
    self.worker.is_finished()
  }

  /// Waits for the worker and returns its summary. Hits not yet received are
  /// dropped.
  pub fn join(self) -> SearchSummary {
    drop(self.hits);
    match self.worker.join() {
      Ok(summary) => summary,
      Err(panic) => std::panic::resume_unwind(panic),
    }
  }
}
