use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use chrono::Local;
use log::{error, info};

use crate::config::VisualizerConfig;
use crate::history::HistoryWindow;
use crate::queue::sample_queue;
use crate::render::{RenderLoop, Renderer};
use crate::sensor::SensorFeed;
use crate::store::{GraphStore, RowId, StoreError};
use crate::types::{now_ms, Axis};

/// Parameters shared between the controller, the producer handle and
/// the render loop.
#[derive(Debug)]
pub struct SessionState {
    pub paused: bool,
    pub pause_started_at: i64,
    pub axis: Axis,
    pub filter_enabled: bool,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Wall-clock reference all sample timestamps are relative to.
    /// Shifted forward across pauses and restarted on surface resize.
    pub epoch_start_ms: i64,
}

pub(crate) struct SessionShared {
    running: AtomicBool,
    state: Mutex<SessionState>,
}

impl SessionShared {
    pub(crate) fn new(config: &VisualizerConfig, epoch_start_ms: i64) -> Self {
        Self {
            running: AtomicBool::new(false),
            state: Mutex::new(SessionState {
                paused: false,
                pause_started_at: epoch_start_ms,
                axis: config.axis,
                filter_enabled: config.filter_enabled,
                canvas_width: 1,
                canvas_height: 1,
                epoch_start_ms,
            }),
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    /// The state is plain data, so a poisoned lock just means some
    /// thread died mid-write; recover the guard and keep going.
    pub(crate) fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn view_params(&self) -> (Axis, u32, u32) {
        let state = self.state();
        (state.axis, state.canvas_width, state.canvas_height)
    }

    pub(crate) fn producer_params(&self) -> (i64, bool) {
        let state = self.state();
        (state.epoch_start_ms, state.filter_enabled)
    }
}

/// Orchestrates run/pause/resume/stop and the axis/filter parameters,
/// and serves save requests against the shared history.
pub struct SessionController {
    shared: Arc<SessionShared>,
    history: Arc<Mutex<HistoryWindow>>,
    store: Box<dyn GraphStore + Send>,
}

impl SessionController {
    pub(crate) fn new(
        shared: Arc<SessionShared>,
        history: Arc<Mutex<HistoryWindow>>,
        store: Box<dyn GraphStore + Send>,
    ) -> Self {
        Self {
            shared,
            history,
            store,
        }
    }

    pub fn start(&self) {
        self.shared.set_running(true);
        info!("session running");
    }

    /// Asks the render loop to exit. The loop checks the flag once per
    /// tick period, so shutdown is prompt but not immediate.
    pub fn stop(&self) {
        self.shared.set_running(false);
        info!("session stopping");
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    pub fn set_paused(&self, paused: bool) {
        self.set_paused_at(paused, now_ms());
    }

    pub(crate) fn set_paused_at(&self, paused: bool, now: i64) {
        let mut state = self.shared.state();
        if state.paused == paused {
            return;
        }
        if paused {
            state.pause_started_at = now;
        } else {
            // Shift the epoch past the pause so elapsed-time
            // coordinates continue as if it never happened.
            state.epoch_start_ms += now - state.pause_started_at;
        }
        state.paused = paused;
        info!("session {}", if paused { "paused" } else { "resumed" });
    }

    pub fn set_filter(&self, enabled: bool) {
        self.shared.state().filter_enabled = enabled;
    }

    pub fn set_axis(&self, axis: Axis) {
        self.shared.state().axis = axis;
    }

    pub fn resize_surface(&self, width: u32, height: u32) {
        self.resize_surface_at(width, height, now_ms());
    }

    pub(crate) fn resize_surface_at(&self, width: u32, height: u32, now: i64) {
        {
            let mut state = self.shared.state();
            state.canvas_width = width;
            state.canvas_height = height;
            state.epoch_start_ms = now;
        }
        // New surface, new time base; retained samples stay.
        self.lock_history().reset_display();
        info!("surface resized to {width}x{height}");
    }

    /// Saves the retained history under a timestamp name.
    pub fn save(&mut self) -> Result<RowId, StoreError> {
        let name = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.save_as(&name)
    }

    pub fn save_as(&mut self, name: &str) -> Result<RowId, StoreError> {
        let snapshot = self.lock_history().snapshot();
        match self.store.save_graph(name, &snapshot) {
            Ok(id) => {
                info!("saved graph {name:?} with {} samples", snapshot.len());
                Ok(id)
            }
            Err(err) => {
                error!("failed to save graph {name:?}: {err}");
                Err(err)
            }
        }
    }

    fn lock_history(&self) -> MutexGuard<'_, HistoryWindow> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Handles for a launched session: the controller for the UI side, the
/// feed for the sensor callback, and the render thread for joining at
/// shutdown.
pub struct Session {
    pub controller: SessionController,
    pub feed: SensorFeed,
    pub render_thread: JoinHandle<()>,
}

/// Wires the whole pipeline together and starts the render thread.
pub fn launch<R, G>(config: VisualizerConfig, surface: Arc<Mutex<R>>, store: G) -> Session
where
    R: Renderer + Send + 'static,
    G: GraphStore + Send + 'static,
{
    let shared = Arc::new(SessionShared::new(&config, now_ms()));
    let history = Arc::new(Mutex::new(HistoryWindow::new()));
    let (sender, queue) = sample_queue();
    let feed = SensorFeed::new(sender, Arc::clone(&shared));
    let controller = SessionController::new(
        Arc::clone(&shared),
        Arc::clone(&history),
        Box::new(store),
    );
    controller.start();
    let render_thread =
        RenderLoop::new(queue, history, surface, shared, config.tick_period_ms).spawn();
    Session {
        controller,
        feed,
        render_thread,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryGraphStore;
    use crate::types::Sample;

    struct SharedStore(Arc<Mutex<MemoryGraphStore>>);

    impl GraphStore for SharedStore {
        fn save_graph(&mut self, name: &str, samples: &[Sample]) -> Result<RowId, StoreError> {
            self.0.lock().unwrap().save_graph(name, samples)
        }
    }

    fn controller_with_store() -> (SessionController, Arc<Mutex<HistoryWindow>>, Arc<Mutex<MemoryGraphStore>>) {
        let config = VisualizerConfig::default();
        let shared = Arc::new(SessionShared::new(&config, 1_000));
        let history = Arc::new(Mutex::new(HistoryWindow::new()));
        let graphs = Arc::new(Mutex::new(MemoryGraphStore::new()));
        let controller = SessionController::new(
            shared,
            Arc::clone(&history),
            Box::new(SharedStore(Arc::clone(&graphs))),
        );
        (controller, history, graphs)
    }

    #[test]
    fn start_and_stop_toggle_the_running_flag() {
        let (controller, _, _) = controller_with_store();
        assert!(!controller.is_running());
        controller.start();
        assert!(controller.is_running());
        controller.stop();
        assert!(!controller.is_running());
    }

    #[test]
    fn resume_shifts_the_epoch_by_the_paused_duration() {
        let (controller, _, _) = controller_with_store();
        let epoch_before = controller.shared.producer_params().0;

        controller.set_paused_at(true, 3_000);
        // The epoch does not move while paused.
        assert_eq!(controller.shared.producer_params().0, epoch_before);

        controller.set_paused_at(false, 8_000);
        assert_eq!(controller.shared.producer_params().0, epoch_before + 5_000);
    }

    #[test]
    fn redundant_pause_calls_do_not_skew_the_epoch() {
        let (controller, _, _) = controller_with_store();
        let epoch_before = controller.shared.producer_params().0;

        controller.set_paused_at(false, 2_000);
        controller.set_paused_at(true, 3_000);
        controller.set_paused_at(true, 4_000);
        controller.set_paused_at(false, 5_000);
        controller.set_paused_at(false, 6_000);

        // Only the 3000..5000 pause counts.
        assert_eq!(controller.shared.producer_params().0, epoch_before + 2_000);
    }

    #[test]
    fn sample_timestamps_are_continuous_across_a_pause() {
        let config = VisualizerConfig {
            filter_enabled: false,
            ..Default::default()
        };
        let shared = Arc::new(SessionShared::new(&config, 10_000));
        let history = Arc::new(Mutex::new(HistoryWindow::new()));
        let controller = SessionController::new(
            Arc::clone(&shared),
            history,
            Box::new(MemoryGraphStore::new()),
        );
        let (sender, queue) = sample_queue();
        let mut feed = SensorFeed::new(sender, Arc::clone(&shared));

        feed.update_at(0.0, 0.0, -9.8, 12_000);
        controller.set_paused_at(true, 13_000);
        controller.set_paused_at(false, 18_000);
        feed.update_at(0.0, 0.0, -9.8, 19_000);

        let timestamps: Vec<i64> = queue.drain_all().iter().map(|s| s.timestamp_ms).collect();
        // The pause lasted 5s of wall time; one second of trace time
        // separates the two samples as if it never happened.
        assert_eq!(timestamps, vec![2_000, 4_000]);
    }

    #[test]
    fn axis_and_filter_updates_are_visible_to_readers() {
        let (controller, _, _) = controller_with_store();
        controller.set_axis(Axis::X);
        controller.set_filter(false);
        let (axis, _, _) = controller.shared.view_params();
        let (_, filter_enabled) = controller.shared.producer_params();
        assert_eq!(axis, Axis::X);
        assert!(!filter_enabled);
    }

    #[test]
    fn resize_restarts_epoch_and_display_but_keeps_samples() {
        let (controller, history, _) = controller_with_store();
        for i in 0..=30 {
            history.lock().unwrap().append(Sample::new(i * 1000, [0.0, 0.0, -9.8]));
        }
        assert!(history.lock().unwrap().display_start() > 0);
        let before = history.lock().unwrap().snapshot();

        controller.resize_surface_at(480, 800, 99_000);

        let state_epoch = controller.shared.producer_params().0;
        let (_, width, height) = controller.shared.view_params();
        assert_eq!((width, height), (480, 800));
        assert_eq!(state_epoch, 99_000);
        assert_eq!(history.lock().unwrap().display_start(), 0);
        assert_eq!(history.lock().unwrap().snapshot(), before);
    }

    #[test]
    fn saving_an_empty_window_succeeds_with_zero_samples() {
        let (mut controller, _, graphs) = controller_with_store();
        let id = controller.save_as("empty run").unwrap();
        assert_eq!(id, 0);
        let graphs = graphs.lock().unwrap();
        assert_eq!(graphs.graphs().len(), 1);
        assert!(graphs.graphs()[0].1.is_empty());
    }

    #[test]
    fn launched_session_drains_updates_into_saved_graphs() {
        let config = VisualizerConfig {
            tick_period_ms: 5,
            ..Default::default()
        };
        let surface = Arc::new(Mutex::new(crate::plot::PngRenderer::new(100, 160)));
        let graphs = Arc::new(Mutex::new(MemoryGraphStore::new()));
        let Session {
            mut controller,
            mut feed,
            render_thread,
        } = launch(config, surface, SharedStore(Arc::clone(&graphs)));
        controller.resize_surface(100, 160);

        for _ in 0..3 {
            feed.update(0.0, 0.0, -9.8);
        }
        // A few tick periods is plenty for the loop to drain the queue.
        std::thread::sleep(std::time::Duration::from_millis(60));

        controller.save_as("smoke").unwrap();
        controller.stop();
        render_thread.join().unwrap();

        assert_eq!(graphs.lock().unwrap().graphs()[0].1.len(), 3);
    }

    #[test]
    fn save_hands_the_full_retained_snapshot_to_the_store() {
        let (mut controller, history, graphs) = controller_with_store();
        for i in 0..3 {
            history.lock().unwrap().append(Sample::new(i * 10, [0.1, 0.2, 0.3]));
        }
        controller.save_as("short burst").unwrap();
        let graphs = graphs.lock().unwrap();
        assert_eq!(graphs.graphs()[0].0, "short burst");
        assert_eq!(graphs.graphs()[0].1.len(), 3);
    }
}
