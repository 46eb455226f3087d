// CalibrationManager: owns the live calibration session and its recording timer
//
// Samples arrive from the device reader while windows are opened from the UI,
// so the session sits behind a mutex. Each window closes itself after its
// duration unless closed by hand or superseded first.

use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::calibration::{
    Action, ActionStats, CalibrationSession, RecordingCompleted, ThresholdSuggestion, WindowId,
};
use crate::config::CalibrationConfig;
use crate::error::{log_calibration_error, CalibrationError};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Recording lifecycle notifications
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum RecordingEvent {
    Started {
        action: Action,
        window_id: WindowId,
        duration_ms: u64,
    },
    /// An open window was discarded by a newer recording
    Superseded {
        action: Action,
        window_id: WindowId,
        sample_count: usize,
    },
    Completed(RecordingCompleted),
}

/// Manages the calibration session for a running sensor stream
///
/// # Example
/// ```ignore
/// let manager = CalibrationManager::new(Handle::current(), config.calibration);
/// manager.start_stream()?;
/// manager.begin_recording(Action::Neutral)?;
/// // ... ingest_sample() from the reader ...
/// let suggestion = manager.suggest()?;
/// ```
pub struct CalibrationManager {
    session: Arc<Mutex<Option<CalibrationSession>>>,
    /// Shared by every session this manager creates
    window_ids: Arc<AtomicU64>,
    timer: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<RecordingEvent>,
    runtime: Handle,
    config: CalibrationConfig,
}

impl CalibrationManager {
    pub fn new(runtime: Handle, config: CalibrationConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            session: Arc::new(Mutex::new(None)),
            window_ids: Arc::new(AtomicU64::new(1)),
            timer: Mutex::new(None),
            events,
            runtime,
            config,
        }
    }

    /// Build on the ambient runtime; panics outside a tokio context
    pub fn from_current(config: CalibrationConfig) -> Self {
        Self::new(Handle::current(), config)
    }

    /// Open a fresh session for a newly started sensor stream
    ///
    /// # Errors
    /// - `StreamAlreadyRunning` if a session is already open
    /// - `StatePoisoned` if the session lock was poisoned
    pub fn start_stream(&self) -> Result<(), CalibrationError> {
        let mut guard = self.lock_session("start_stream")?;
        if guard.is_some() {
            let err = CalibrationError::StreamAlreadyRunning;
            log_calibration_error(&err, "start_stream");
            return Err(err);
        }

        *guard = Some(CalibrationSession::with_window_ids(
            self.config.defaults,
            self.config.rules,
            Arc::clone(&self.window_ids),
        ));
        log::info!("[CalibrationManager] Sensor stream started");
        Ok(())
    }

    /// Stop the stream and hand back its session
    ///
    /// An open window is dropped along with its timer. Window ids keep
    /// counting across streams, so a timer of this stream that already fired
    /// cannot close a window of the next one.
    ///
    /// # Errors
    /// - `StreamNotRunning` if no stream is running
    /// - `StatePoisoned` if the session lock was poisoned
    pub fn stop_stream(&self) -> Result<CalibrationSession, CalibrationError> {
        self.cancel_timer();
        let mut guard = self.lock_session("stop_stream")?;
        let session = guard.take().ok_or_else(|| {
            let err = CalibrationError::StreamNotRunning;
            log_calibration_error(&err, "stop_stream");
            err
        })?;
        log::info!(
            "[CalibrationManager] Sensor stream stopped ({} actions recorded)",
            session.recorded_actions().len()
        );
        Ok(session)
    }

    /// Whether a stream is running; a poisoned lock reads as not running
    pub fn is_streaming(&self) -> bool {
        self.session
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Record `action` for the configured window duration
    pub fn begin_recording(&self, action: Action) -> Result<WindowId, CalibrationError> {
        self.begin_recording_for(action, self.config.window_duration())
    }

    /// Record `action` for `duration`, superseding any open window
    ///
    /// Arms a single-shot timer that closes this window, and only this
    /// window, once `duration` has elapsed.
    ///
    /// # Returns
    /// Id of the opened window, as carried by its `Started`/`Completed` events
    ///
    /// # Errors
    /// - `StreamNotRunning` if no stream is running
    /// - `StatePoisoned` if the session lock was poisoned
    pub fn begin_recording_for(
        &self,
        action: Action,
        duration: Duration,
    ) -> Result<WindowId, CalibrationError> {
        self.cancel_timer();

        let id = {
            let mut guard = self.lock_session("begin_recording")?;
            let session = Self::running(&mut guard, "begin_recording")?;

            if let (Some(previous), Some(previous_id)) =
                (session.open_action(), session.open_window_id())
            {
                self.emit(RecordingEvent::Superseded {
                    action: previous,
                    window_id: previous_id,
                    sample_count: session.open_sample_count(),
                });
            }
            session.begin_recording(action, duration)
        };

        self.emit(RecordingEvent::Started {
            action,
            window_id: id,
            duration_ms: duration.as_millis() as u64,
        });

        let session = Arc::clone(&self.session);
        let events = self.events.clone();
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            let completed = match session.lock() {
                Ok(mut guard) => guard
                    .as_mut()
                    .and_then(|session| session.end_recording_window(id)),
                Err(_) => {
                    log_calibration_error(&CalibrationError::StatePoisoned, "recording_timer");
                    None
                }
            };
            if let Some(completed) = completed {
                let _ = events.send(RecordingEvent::Completed(completed));
            }
        });

        if let Ok(mut timer) = self.timer.lock() {
            *timer = Some(handle);
        }
        Ok(id)
    }

    /// Feed one raw calibration sample into the running session
    ///
    /// # Errors
    /// - `StreamNotRunning` if no stream is running
    /// - `StatePoisoned` if the session lock was poisoned
    pub fn ingest_sample(&self, raw_value: i32) -> Result<(), CalibrationError> {
        let mut guard = self.lock_session("ingest_sample")?;
        Self::running(&mut guard, "ingest_sample")?.ingest_sample(raw_value);
        Ok(())
    }

    /// Close the open window now instead of waiting for its timer
    ///
    /// # Returns
    /// The completed window, or `None` if nothing was open
    pub fn end_recording(&self) -> Result<Option<RecordingCompleted>, CalibrationError> {
        self.cancel_timer();
        let completed = {
            let mut guard = self.lock_session("end_recording")?;
            Self::running(&mut guard, "end_recording")?.end_recording()
        };
        if let Some(completed) = &completed {
            self.emit(RecordingEvent::Completed(completed.clone()));
        }
        Ok(completed)
    }

    /// Trimmed statistics of the latest window for `action`
    ///
    /// # Errors
    /// - `StreamNotRunning` if no stream is running
    pub fn compute_stats(&self, action: Action) -> Result<ActionStats, CalibrationError> {
        let mut guard = self.lock_session("compute_stats")?;
        Ok(Self::running(&mut guard, "compute_stats")?.compute_stats(action))
    }

    /// Thresholds derived from everything recorded so far
    ///
    /// # Errors
    /// - `StreamNotRunning` if no stream is running
    pub fn suggest(&self) -> Result<ThresholdSuggestion, CalibrationError> {
        let mut guard = self.lock_session("suggest")?;
        Ok(Self::running(&mut guard, "suggest")?.suggest())
    }

    /// Last sample seen, inside a window or not
    pub fn current_value(&self) -> Result<Option<i32>, CalibrationError> {
        let mut guard = self.lock_session("current_value")?;
        Ok(Self::running(&mut guard, "current_value")?.current_value())
    }

    /// Receiver for every `RecordingEvent`
    pub fn subscribe(&self) -> broadcast::Receiver<RecordingEvent> {
        self.events.subscribe()
    }

    /// Completed windows only; lagged receivers skip what they missed
    pub fn completions(&self) -> impl Stream<Item = RecordingCompleted> + Send + 'static {
        BroadcastStream::new(self.events.subscribe()).filter_map(|event| match event {
            Ok(RecordingEvent::Completed(completed)) => Some(completed),
            _ => None,
        })
    }

    // ========================================================================
    // HELPER METHODS
    // ========================================================================

    fn lock_session(
        &self,
        context: &str,
    ) -> Result<MutexGuard<'_, Option<CalibrationSession>>, CalibrationError> {
        self.session.lock().map_err(|_| {
            let err = CalibrationError::StatePoisoned;
            log_calibration_error(&err, context);
            err
        })
    }

    fn running<'a>(
        guard: &'a mut MutexGuard<'_, Option<CalibrationSession>>,
        context: &str,
    ) -> Result<&'a mut CalibrationSession, CalibrationError> {
        guard.as_mut().ok_or_else(|| {
            let err = CalibrationError::StreamNotRunning;
            log_calibration_error(&err, context);
            err
        })
    }

    fn cancel_timer(&self) {
        if let Ok(mut timer) = self.timer.lock() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
    }

    fn emit(&self, event: RecordingEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Drop for CalibrationManager {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::DEFAULT_RECORDING_DURATION;

    fn manager() -> CalibrationManager {
        CalibrationManager::from_current(CalibrationConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_requires_running_stream() {
        let manager = manager();
        assert_eq!(
            manager.begin_recording(Action::Neutral),
            Err(CalibrationError::StreamNotRunning)
        );
        assert_eq!(manager.ingest_sample(5), Err(CalibrationError::StreamNotRunning));
        assert!(matches!(manager.suggest(), Err(CalibrationError::StreamNotRunning)));
        assert!(matches!(manager.stop_stream(), Err(CalibrationError::StreamNotRunning)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_stream_twice() {
        let manager = manager();
        manager.start_stream().unwrap();
        assert!(manager.is_streaming());
        assert_eq!(
            manager.start_stream(),
            Err(CalibrationError::StreamAlreadyRunning)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_closes_window() {
        let manager = manager();
        let mut events = manager.subscribe();
        manager.start_stream().unwrap();

        let id = manager.begin_recording(Action::SoftPuff).unwrap();
        for value in [80, 90, 100] {
            manager.ingest_sample(value).unwrap();
        }

        assert!(matches!(
            events.recv().await.unwrap(),
            RecordingEvent::Started { action: Action::SoftPuff, duration_ms: 3000, .. }
        ));

        tokio::time::sleep(DEFAULT_RECORDING_DURATION + Duration::from_millis(10)).await;

        match events.recv().await.unwrap() {
            RecordingEvent::Completed(done) => {
                assert_eq!(done.window_id, id);
                assert_eq!(done.sample_count, 3);
            }
            other => panic!("unexpected event {:?}", other),
        }

        // samples after the window closed only move the live value
        manager.ingest_sample(500).unwrap();
        assert_eq!(manager.compute_stats(Action::SoftPuff).unwrap().average, 90);
        assert_eq!(manager.current_value().unwrap(), Some(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_timer_does_not_close_new_window() {
        let manager = manager();
        let mut events = manager.subscribe();
        manager.start_stream().unwrap();

        manager
            .begin_recording_for(Action::SoftSip, Duration::from_millis(100))
            .unwrap();
        manager.ingest_sample(-80).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = manager
            .begin_recording_for(Action::HardSip, Duration::from_millis(1000))
            .unwrap();
        manager.ingest_sample(-250).unwrap();

        // first window's deadline passes with the second still open
        tokio::time::sleep(Duration::from_millis(200)).await;
        manager.ingest_sample(-270).unwrap();

        tokio::time::sleep(Duration::from_millis(1000)).await;

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert!(seen.iter().any(|e| matches!(
            e,
            RecordingEvent::Superseded { action: Action::SoftSip, sample_count: 1, .. }
        )));
        let completed: Vec<_> = seen
            .iter()
            .filter_map(|e| match e {
                RecordingEvent::Completed(done) => Some(done.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].window_id, second);
        assert_eq!(completed[0].sample_count, 2);

        assert_eq!(manager.compute_stats(Action::SoftSip).unwrap().count, 0);
        assert_eq!(manager.compute_stats(Action::HardSip).unwrap().average, -260);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_end_cancels_timer() {
        let manager = manager();
        manager.start_stream().unwrap();
        let mut completions = Box::pin(manager.completions());

        manager.begin_recording(Action::Neutral).unwrap();
        manager.ingest_sample(2).unwrap();
        let done = manager.end_recording().unwrap().unwrap();
        assert_eq!(done.sample_count, 1);

        let streamed = completions.next().await.unwrap();
        assert_eq!(streamed, done);

        // nothing left to close once the old deadline passes
        tokio::time::sleep(DEFAULT_RECORDING_DURATION * 2).await;
        assert_eq!(manager.end_recording().unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_stream_returns_session() {
        let manager = manager();
        manager.start_stream().unwrap();
        manager.begin_recording(Action::HardPuff).unwrap();
        manager.ingest_sample(300).unwrap();
        manager.end_recording().unwrap();

        let session = manager.stop_stream().unwrap();
        assert_eq!(session.recorded_actions(), vec![Action::HardPuff]);
        assert!(!manager.is_streaming());

        // a new stream starts clean
        manager.start_stream().unwrap();
        assert_eq!(manager.compute_stats(Action::HardPuff).unwrap().count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restarted_stream_window_survives_old_deadline() {
        let manager = manager();
        manager.start_stream().unwrap();
        let old = manager.begin_recording(Action::SoftSip).unwrap();
        manager.ingest_sample(-90).unwrap();

        tokio::time::sleep(Duration::from_millis(1000)).await;
        let stopped = manager.stop_stream().unwrap();
        assert!(stopped.recorded_actions().is_empty());

        manager.start_stream().unwrap();
        let new = manager.begin_recording(Action::HardSip).unwrap();
        assert_ne!(old, new);

        // a timer of the old stream that already fired closes nothing now
        {
            let mut guard = manager.lock_session("test").unwrap();
            let session = guard.as_mut().unwrap();
            assert_eq!(session.end_recording_window(old), None);
            assert_eq!(session.open_window_id(), Some(new));
        }

        // old deadline passes, new window still collects
        tokio::time::sleep(Duration::from_millis(2500)).await;
        manager.ingest_sample(-250).unwrap();

        let done = manager.end_recording().unwrap().unwrap();
        assert_eq!(done.window_id, new);
        assert_eq!(done.sample_count, 1);
        assert_eq!(manager.compute_stats(Action::SoftSip).unwrap().count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_suggest_with_defaults_only() {
        let manager = manager();
        manager.start_stream().unwrap();
        let suggestion = manager.suggest().unwrap();
        assert!(suggestion.thresholds.is_ordered());
        assert_eq!(suggestion.thresholds.hpt, 200);
    }
}
