//! Single-shot handoff of an initialized audio source.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::Duration;

use crate::error::AudioError;

/// Result of polling a [`PendingAudio`]
#[derive(Debug)]
pub enum AudioPoll<S> {
    /// Initialization still in progress
    Pending,
    Ready(S),
    Failed(AudioError),
    /// The optional timeout elapsed before a result arrived
    TimedOut,
}

/// Sending half; consumed by the one and only send
#[derive(Debug)]
pub struct AudioReady<S> {
    tx: Sender<Result<S, AudioError>>,
}

impl<S> AudioReady<S> {
    /// Report the initialization result. Returns false if nobody is listening.
    pub fn send(self, result: Result<S, AudioError>) -> bool {
        self.tx.send(result).is_ok()
    }
}

/// Audio source that may not be ready yet
#[derive(Debug)]
pub struct PendingAudio<S> {
    rx: Receiver<Result<S, AudioError>>,
    timeout: Option<Duration>,
}

impl<S> PendingAudio<S> {
    /// Create a connected sender / pending pair
    pub fn channel() -> (AudioReady<S>, Self) {
        let (tx, rx) = mpsc::channel();
        (AudioReady { tx }, Self { rx, timeout: None })
    }

    /// Give up after `timeout` of waiting
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Check for a result without blocking. `waited` is how long the caller has
    /// been waiting so far, measured on its own clock.
    pub fn poll(&self, waited: Duration) -> AudioPoll<S> {
        match self.rx.try_recv() {
            Ok(Ok(source)) => AudioPoll::Ready(source),
            Ok(Err(e)) => AudioPoll::Failed(e),
            Err(TryRecvError::Disconnected) => AudioPoll::Failed(AudioError::Disconnected),
            Err(TryRecvError::Empty) => match self.timeout {
                Some(timeout) if waited >= timeout => AudioPoll::TimedOut,
                _ => AudioPoll::Pending,
            },
        }
    }

    /// Block until the result arrives (or the timeout elapses)
    pub fn wait(self) -> AudioPoll<S> {
        let received = match self.timeout {
            Some(timeout) => match self.rx.recv_timeout(timeout) {
                Ok(r) => r,
                Err(mpsc::RecvTimeoutError::Timeout) => return AudioPoll::TimedOut,
                Err(mpsc::RecvTimeoutError::Disconnected) => Err(AudioError::Disconnected),
            },
            None => self.rx.recv().unwrap_or(Err(AudioError::Disconnected)),
        };

        match received {
            Ok(source) => AudioPoll::Ready(source),
            Err(e) => AudioPoll::Failed(e),
        }
    }
}
