use std::sync::{Arc, Mutex};

use dagrun::dag::TaskState;
use dagrun::engine::{RunObserver, TaskEvent};

/// Shared list of task ids whose executors were actually invoked, in
/// invocation order.
#[derive(Debug, Clone, Default)]
pub struct InvocationLog {
    inner: Arc<Mutex<Vec<String>>>,
}

impl InvocationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, id: &str) {
        self.inner.lock().unwrap().push(id.to_string());
    }

    pub fn invoked(&self) -> Vec<String> {
        self.inner.lock().unwrap().clone()
    }

    pub fn was_invoked(&self, id: &str) -> bool {
        self.inner.lock().unwrap().iter().any(|i| i == id)
    }
}

/// Observer that keeps every event it sees.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<TaskEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<TaskEvent> {
        self.events.lock().unwrap().clone()
    }

    /// States `id` went through, in order.
    pub fn states_of(&self, id: &str) -> Vec<TaskState> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.id == id)
            .map(|e| e.state)
            .collect()
    }

    /// Most tasks observed `Running` at the same time.
    pub fn peak_running(&self) -> usize {
        let mut running = 0usize;
        let mut peak = 0usize;
        for event in self.events.lock().unwrap().iter() {
            match event.state {
                TaskState::Running => {
                    running += 1;
                    peak = peak.max(running);
                }
                TaskState::Succeeded | TaskState::Failed => {
                    running = running.saturating_sub(1);
                }
                _ => {}
            }
        }
        peak
    }
}

impl RunObserver for RecordingObserver {
    fn on_event(&self, event: &TaskEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
