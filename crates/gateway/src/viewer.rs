use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Pulls frames from wherever the worker publishes them. Implementations
/// return `None` when nothing new is available yet.
pub trait FrameProducer: Send + 'static {
    fn next_frame(&mut self) -> Option<Vec<u8>>;
}

type ProducerFactory = Box<dyn Fn() -> Box<dyn FrameProducer> + Send + Sync>;

struct ViewerState {
    viewers: usize,
    task: Option<(watch::Sender<bool>, JoinHandle<()>)>,
}

/// Fans one producer out to any number of stream clients.
///
/// The capture task exists only while someone is watching: the first
/// [`attach`](Self::attach) starts it, the last [`detach`](Self::detach)
/// stops it. Clients read frames from the shared `latest` cell at their own
/// pace; slow clients skip frames instead of backing up the producer.
pub struct StreamViewer {
    make_producer: ProducerFactory,
    interval: Duration,
    latest_tx: watch::Sender<Option<Arc<Vec<u8>>>>,
    state: tokio::sync::Mutex<ViewerState>,
}

impl StreamViewer {
    pub fn new(
        make_producer: impl Fn() -> Box<dyn FrameProducer> + Send + Sync + 'static,
        interval: Duration,
    ) -> Self {
        let (latest_tx, _) = watch::channel(None);
        Self {
            make_producer: Box::new(make_producer),
            interval,
            latest_tx,
            state: tokio::sync::Mutex::new(ViewerState {
                viewers: 0,
                task: None,
            }),
        }
    }

    /// Most recently captured frame, if the task has produced one.
    pub fn latest(&self) -> watch::Receiver<Option<Arc<Vec<u8>>>> {
        self.latest_tx.subscribe()
    }

    pub async fn viewer_count(&self) -> usize {
        self.state.lock().await.viewers
    }

    /// Register a viewer. Starts the capture task on the 0 -> 1 transition.
    pub async fn attach(self: &Arc<Self>) -> StreamGuard {
        let mut state = self.state.lock().await;
        state.viewers += 1;
        tracing::info!(viewers = state.viewers, "Stream viewer attached");

        if state.viewers == 1 {
            let (stop_tx, stop_rx) = watch::channel(false);
            let handle = tokio::spawn(capture_task(
                (self.make_producer)(),
                self.interval,
                self.latest_tx.clone(),
                stop_rx,
            ));
            state.task = Some((stop_tx, handle));
        }

        StreamGuard {
            viewer: Some(Arc::clone(self)),
        }
    }

    /// Deregister a viewer. Stops the capture task on the 1 -> 0 transition
    /// and clears the latest frame so the next session starts fresh.
    pub async fn detach(&self) {
        let mut state = self.state.lock().await;
        state.viewers = state.viewers.saturating_sub(1);
        tracing::info!(viewers = state.viewers, "Stream viewer detached");

        if state.viewers == 0
            && let Some((stop_tx, handle)) = state.task.take()
        {
            let _ = stop_tx.send(true);
            if let Err(e) = handle.await {
                tracing::warn!("Capture task panicked: {e}");
            }
            self.latest_tx.send_replace(None);
        }
    }
}

async fn capture_task(
    mut producer: Box<dyn FrameProducer>,
    interval: Duration,
    latest_tx: watch::Sender<Option<Arc<Vec<u8>>>>,
    mut stop_rx: watch::Receiver<bool>,
) {
    tracing::info!("Capture task started");
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {
                if let Some(frame) = producer.next_frame() {
                    latest_tx.send_replace(Some(Arc::new(frame)));
                }
            }
        }
    }
    tracing::info!("Capture task stopped");
}

/// Ties a viewer registration to a connection's lifetime. Dropping the guard
/// detaches, including on panic or abrupt disconnect.
pub struct StreamGuard {
    viewer: Option<Arc<StreamViewer>>,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if let Some(viewer) = self.viewer.take() {
            tokio::spawn(async move { viewer.detach().await });
        }
    }
}
