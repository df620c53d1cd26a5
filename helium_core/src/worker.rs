//! Background loop ownership with a cooperative stop protocol.
//!
//! Each `Worker` owns exactly one named thread. Stopping is a single request
//! (dropping the sending half of a channel, which every later wait observes)
//! followed by a one-shot acknowledgement (joining the thread). The thread is
//! stopped and joined when the `Worker` is dropped, preventing thread leaks.
use crossbeam_channel as xch;
use std::thread::JoinHandle;
use std::time::Duration;

/// Stop side handed to the loop body.
pub struct StopSignal {
    rx: xch::Receiver<()>,
}

impl StopSignal {
    /// Sleep for up to `d`, returning `true` as soon as a stop is requested.
    pub fn wait(&self, d: Duration) -> bool {
        match self.rx.recv_timeout(d) {
            Ok(()) | Err(xch::RecvTimeoutError::Disconnected) => true,
            Err(xch::RecvTimeoutError::Timeout) => false,
        }
    }

    /// Like [`wait`](Self::wait), but also returns early (with `false`) when
    /// `wake` receives a message. A disconnected `wake` is ignored.
    pub fn wait_or_wake(&self, wake: &xch::Receiver<()>, d: Duration) -> bool {
        xch::select! {
            recv(self.rx) -> _ => true,
            recv(wake) -> msg => match msg {
                Ok(()) => false,
                Err(_) => self.wait(d),
            },
            default(d) => false,
        }
    }

    /// Non-blocking check.
    pub fn is_requested(&self) -> bool {
        !matches!(self.rx.try_recv(), Err(xch::TryRecvError::Empty))
    }
}

pub struct Worker {
    name: String,
    stop_tx: Option<xch::Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn<F>(name: impl Into<String>, body: F) -> std::io::Result<Self>
    where
        F: FnOnce(StopSignal) + Send + 'static,
    {
        let name = name.into();
        // Nothing is ever sent; dropping the sender is the stop request.
        let (stop_tx, rx) = xch::bounded::<()>(0);
        let join_handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || body(StopSignal { rx }))?;
        tracing::debug!(worker = %name, "worker spawned");
        Ok(Self {
            name,
            stop_tx: Some(stop_tx),
            join_handle: Some(join_handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the loop to exit without waiting for it.
    pub fn request_stop(&mut self) {
        self.stop_tx.take();
    }

    /// Request a stop and wait for the loop to acknowledge by exiting.
    ///
    /// Returns `true` on the call that actually joined the thread; later calls
    /// are no-ops returning `false` and never block.
    pub fn stop(&mut self) -> bool {
        self.request_stop();
        let Some(handle) = self.join_handle.take() else {
            return false;
        };
        match handle.join() {
            Ok(()) => tracing::trace!(worker = %self.name, "worker joined"),
            Err(e) => tracing::warn!(worker = %self.name, ?e, "worker panicked before stop"),
        }
        true
    }

    /// True while the thread has not been joined and has not exited on its own.
    pub fn is_running(&self) -> bool {
        self.join_handle
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}
