//! Exit-transition completion signal
//!
//! A closed entry keeps drawing for a few ticks while it fades out. Code that
//! must not act until the surface is really gone (the navigation guard, for
//! instance) waits on an [`ExitSignal`] instead of guessing a delay.

use tokio::sync::oneshot;

/// Resolves once an entry's exit transition has finished
#[derive(Debug)]
pub struct ExitSignal {
    receiver: Option<oneshot::Receiver<()>>,
}

impl ExitSignal {
    /// A signal that has already fired
    pub fn ready() -> Self {
        Self { receiver: None }
    }

    pub(crate) fn pair() -> (ExitNotifier, Self) {
        let (sender, receiver) = oneshot::channel();
        (
            ExitNotifier(sender),
            Self {
                receiver: Some(receiver),
            },
        )
    }

    /// Check without waiting
    pub fn is_complete(&mut self) -> bool {
        let Some(receiver) = self.receiver.as_mut() else {
            return true;
        };
        if matches!(receiver.try_recv(), Err(oneshot::error::TryRecvError::Empty)) {
            return false;
        }
        // A completed receiver must not be polled again
        self.receiver = None;
        true
    }

    /// Wait for the transition to finish
    ///
    /// A registry dropped before the transition ends also completes the signal.
    pub async fn wait(self) {
        if let Some(receiver) = self.receiver {
            let _ = receiver.await;
        }
    }
}

/// Registry-side half of an [`ExitSignal`]
#[derive(Debug)]
pub(crate) struct ExitNotifier(oneshot::Sender<()>);

impl ExitNotifier {
    /// The matching signal was dropped
    pub(crate) fn is_closed(&self) -> bool {
        self.0.is_closed()
    }

    pub(crate) fn notify(self) {
        // Nobody waiting any more is fine
        let _ = self.0.send(());
    }
}
