//! Thread-safe handle for hosts that drive frames and gestures from
//! different threads.
//!
//! Every entry point takes the same mutex, so a frame step and a gesture
//! handler never interleave on the node list.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use super::engine::{CategoryChangeListener, ClusterEngine};
use super::geometry::Point;
use super::interaction::DragRelease;
use super::node::ClusterSnapshot;
use super::physics::StepReport;
use crate::events::Event;

/// Shared cluster engine, protected by a Mutex.
#[derive(Debug, Clone)]
pub struct SharedCluster(Arc<Mutex<ClusterEngine>>);

impl SharedCluster {
    pub fn new(engine: ClusterEngine) -> Self {
        Self(Arc::new(Mutex::new(engine)))
    }

    /// Lock the engine, recovering a poisoned lock.
    pub fn lock(&self) -> MutexGuard<'_, ClusterEngine> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn tick(&self) -> StepReport {
        self.lock().tick()
    }

    pub fn snapshot(&self) -> ClusterSnapshot {
        self.lock().snapshot()
    }

    pub fn begin_drag(&self, node_id: &str) -> Option<Event> {
        self.lock().begin_drag(node_id)
    }

    pub fn update_drag(&self, translation: Point) -> Option<Point> {
        self.lock().update_drag(translation)
    }

    /// End the drag, then notify `listener` with the lock released so it
    /// may call back into this handle.
    pub fn end_drag<L>(&self, listener: &mut L) -> Option<DragRelease>
    where
        L: CategoryChangeListener + ?Sized,
    {
        let mut change: Option<(String, Option<String>)> = None;
        let release = self
            .lock()
            .end_drag(&mut |project_id: &str, category_id: Option<&str>| {
                change = Some((project_id.to_string(), category_id.map(String::from)));
            });
        if let Some((project_id, category_id)) = change {
            listener.on_project_category_change(&project_id, category_id.as_deref());
        }
        release
    }

    pub fn teardown(&self) -> Option<Event> {
        self.lock().teardown()
    }

    pub fn drain_events(&self) -> Vec<Event> {
        self.lock().drain_events()
    }
}

/// Background frame loop calling `tick()` at a fixed interval.
///
/// The loop ends when [`FrameDriver::stop`] is called, when the driver is
/// dropped, or when the engine is torn down.
#[derive(Debug)]
pub struct FrameDriver {
    stop: Arc<AtomicBool>,
    frames: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl FrameDriver {
    pub fn spawn(cluster: SharedCluster, interval: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let frames = Arc::new(AtomicU64::new(0));
        let handle = {
            let stop = Arc::clone(&stop);
            let frames = Arc::clone(&frames);
            std::thread::spawn(move || {
                while !stop.load(Ordering::Acquire) {
                    {
                        let mut engine = cluster.lock();
                        if engine.is_torn_down() {
                            break;
                        }
                        engine.tick();
                    }
                    frames.fetch_add(1, Ordering::Release);
                    std::thread::sleep(interval);
                }
                tracing::debug!("frame driver stopped");
            })
        };
        Self {
            stop,
            frames,
            handle: Some(handle),
        }
    }

    /// Frames ticked so far.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the loop and wait for the in-flight frame to finish.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("frame driver thread panicked");
            }
        }
    }
}

impl Drop for FrameDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::anchor::Category;
    use crate::cluster::engine::ClusterSettings;
    use crate::cluster::node::ProjectInput;

    fn cluster() -> SharedCluster {
        let mut engine = ClusterEngine::new(ClusterSettings::default().with_seed(1)).unwrap();
        engine.reconcile(
            &[Category {
                id: "a".into(),
                name: "A".into(),
                color: "#f00".into(),
                center: Point::new(400.0, 300.0),
                radius: None,
            }],
            &[ProjectInput {
                id: "p".into(),
                name: "P".into(),
                percent: 0.0,
                category_id: Some("a".into()),
            }],
        );
        SharedCluster::new(engine)
    }

    #[test]
    fn shared_handle_serializes_calls() {
        let cluster = cluster();
        let other = cluster.clone();
        let worker = std::thread::spawn(move || {
            for _ in 0..50 {
                other.tick();
            }
        });
        for _ in 0..50 {
            cluster.snapshot();
        }
        worker.join().unwrap();
        assert_eq!(cluster.lock().frame(), 50);
    }

    #[test]
    fn listener_can_call_back_into_handle() {
        let cluster = cluster();
        let handle = cluster.clone();
        let worker = std::thread::spawn(move || {
            handle.begin_drag("p");
            let grab = handle.lock().node("p").unwrap().position();
            handle.update_drag(Point::new(50.0 - grab.x, 50.0 - grab.y));
            let callback = handle.clone();
            let mut seen = Vec::new();
            handle.end_drag(&mut |id: &str, category_id: Option<&str>| {
                seen.push((id.to_string(), category_id.map(String::from)));
                callback.lock().submit(Vec::new(), Vec::new());
                callback.tick();
            });
            seen
        });

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !worker.is_finished() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(worker.is_finished(), "end_drag did not return");
        assert_eq!(worker.join().unwrap(), vec![("p".to_string(), None)]);
        assert!(cluster.lock().nodes().is_empty());
    }

    #[test]
    fn drain_events_through_handle() {
        let cluster = cluster();
        assert!(!cluster.drain_events().is_empty());
        cluster.begin_drag("p");
        let events = cluster.drain_events();
        assert!(matches!(events.as_slice(), [Event::DragStarted { .. }]));
        assert!(cluster.drain_events().is_empty());
    }

    #[test]
    fn stop_halts_frames() {
        let cluster = cluster();
        let mut driver = FrameDriver::spawn(cluster.clone(), Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(30));
        driver.stop();
        let frames = cluster.lock().frame();
        assert!(frames > 0);
        assert!(!driver.is_running());
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(cluster.lock().frame(), frames);
        assert_eq!(driver.frames(), frames);
    }

    #[test]
    fn teardown_ends_the_loop() {
        let cluster = cluster();
        let driver = FrameDriver::spawn(cluster.clone(), Duration::from_millis(1));
        cluster.teardown();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while driver.is_running() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(!driver.is_running());
    }
}
