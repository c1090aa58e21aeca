use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;

use quiz_core::model::QuizId;

/// Change to the quiz catalog's backing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogChange {
    QuizAdded(QuizId),
    QuizRemoved(QuizId),
}

/// A submission reached the submission stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionChange {
    Recorded { quiz_id: QuizId },
}

const STREAM_CAPACITY: usize = 32;

struct StreamState<T> {
    sender: Option<broadcast::Sender<T>>,
    watchers: usize,
}

impl<T> Default for StreamState<T> {
    fn default() -> Self {
        Self {
            sender: None,
            watchers: 0,
        }
    }
}

/// Reference-counted subscription handle.
///
/// The underlying stream is established when the first watch is taken and
/// torn down when the last one is dropped, so a stream is never left
/// dangling and never established twice while a consumer is active.
pub struct Watch<T> {
    rx: broadcast::Receiver<T>,
    stream: Arc<Mutex<StreamState<T>>>,
}

impl<T: Clone> Watch<T> {
    /// Wait for the next event; `None` once the stream is gone.
    ///
    /// A slow consumer that misses events skips ahead rather than erroring.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<T> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => return None,
            }
        }
    }
}

impl<T> Drop for Watch<T> {
    fn drop(&mut self) {
        let mut state = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        state.watchers = state.watchers.saturating_sub(1);
        if state.watchers == 0 {
            state.sender = None;
        }
    }
}

pub type CatalogWatch = Watch<CatalogChange>;
pub type SubmissionWatch = Watch<SubmissionChange>;

/// Hub for the two change streams consumers can watch: catalog changes and
/// submission insertions.
///
/// Publishing with no watchers is a silent no-op; the streams only exist
/// while someone watches them.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    catalog: Arc<Mutex<StreamState<CatalogChange>>>,
    submissions: Arc<Mutex<StreamState<SubmissionChange>>>,
}

impl ChangeNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn watch<T: Clone>(stream: &Arc<Mutex<StreamState<T>>>) -> Watch<T> {
        let mut state = stream.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = match &state.sender {
            Some(sender) => sender.clone(),
            None => {
                let (sender, _) = broadcast::channel(STREAM_CAPACITY);
                state.sender = Some(sender.clone());
                sender
            }
        };
        state.watchers += 1;
        Watch {
            rx: sender.subscribe(),
            stream: Arc::clone(stream),
        }
    }

    fn publish<T: Clone>(stream: &Arc<Mutex<StreamState<T>>>, event: T) {
        let state = stream.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = &state.sender {
            // Send only fails with zero receivers, which cannot outlive the
            // watcher count going to zero; either way it is a no-op.
            let _ = sender.send(event);
        }
    }

    #[must_use]
    pub fn watch_catalog(&self) -> CatalogWatch {
        Self::watch(&self.catalog)
    }

    #[must_use]
    pub fn watch_submissions(&self) -> SubmissionWatch {
        Self::watch(&self.submissions)
    }

    pub fn publish_catalog(&self, event: CatalogChange) {
        Self::publish(&self.catalog, event);
    }

    pub fn publish_submission(&self, event: SubmissionChange) {
        Self::publish(&self.submissions, event);
    }

    /// Active catalog watches, for diagnostics and tests.
    #[must_use]
    pub fn catalog_watchers(&self) -> usize {
        self.catalog
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .watchers
    }

    /// Active submission watches, for diagnostics and tests.
    #[must_use]
    pub fn submission_watchers(&self) -> usize {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .watchers
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_counts_follow_acquire_and_release() {
        let notifier = ChangeNotifier::new();
        assert_eq!(notifier.catalog_watchers(), 0);

        let first = notifier.watch_catalog();
        let second = notifier.watch_catalog();
        assert_eq!(notifier.catalog_watchers(), 2);

        drop(first);
        assert_eq!(notifier.catalog_watchers(), 1);
        drop(second);
        assert_eq!(notifier.catalog_watchers(), 0);
    }

    #[test]
    fn stream_is_torn_down_after_last_watcher() {
        let notifier = ChangeNotifier::new();
        let watch = notifier.watch_catalog();
        assert!(notifier.catalog.lock().unwrap().sender.is_some());
        drop(watch);
        assert!(notifier.catalog.lock().unwrap().sender.is_none());
    }

    #[test]
    fn publish_without_watchers_is_a_no_op() {
        let notifier = ChangeNotifier::new();
        notifier.publish_catalog(CatalogChange::QuizAdded(QuizId::new(1)));
        notifier.publish_submission(SubmissionChange::Recorded {
            quiz_id: QuizId::new(1),
        });
    }

    #[tokio::test]
    async fn events_reach_every_active_watcher() {
        let notifier = ChangeNotifier::new();
        let mut first = notifier.watch_catalog();
        let mut second = notifier.watch_catalog();

        notifier.publish_catalog(CatalogChange::QuizAdded(QuizId::new(3)));

        assert_eq!(
            first.recv().await,
            Some(CatalogChange::QuizAdded(QuizId::new(3)))
        );
        assert_eq!(
            second.recv().await,
            Some(CatalogChange::QuizAdded(QuizId::new(3)))
        );
    }

    #[tokio::test]
    async fn rewatching_after_teardown_establishes_a_fresh_stream() {
        let notifier = ChangeNotifier::new();

        let watch = notifier.watch_submissions();
        drop(watch);

        // Published while nobody watched; must not be seen later.
        notifier.publish_submission(SubmissionChange::Recorded {
            quiz_id: QuizId::new(1),
        });

        let mut watch = notifier.watch_submissions();
        assert_eq!(watch.try_recv(), None);

        notifier.publish_submission(SubmissionChange::Recorded {
            quiz_id: QuizId::new(2),
        });
        assert_eq!(
            watch.recv().await,
            Some(SubmissionChange::Recorded {
                quiz_id: QuizId::new(2)
            })
        );
    }

    #[test]
    fn streams_are_independent() {
        let notifier = ChangeNotifier::new();
        let _catalog = notifier.watch_catalog();
        assert_eq!(notifier.catalog_watchers(), 1);
        assert_eq!(notifier.submission_watchers(), 0);
    }
}
