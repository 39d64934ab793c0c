//! Shared telemetry hand-off.
//!
//! The data task publishes whole snapshots under a mutex; the UI task copies
//! the latest out once per tick and works on its private copy. Neither side
//! holds the lock across anything slower than a clone.

use std::sync::Mutex;

/// Latest-value cell shared between the data task and the UI task.
#[derive(Debug, Default)]
pub struct SharedSnapshot<T> {
    slot: Mutex<T>,
}

impl<T: Clone> SharedSnapshot<T> {
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            slot: Mutex::new(initial),
        }
    }

    /// Replace the published value. Producer side.
    pub fn publish(&self, value: T) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = value;
    }

    /// Mutate the published value in place under the lock. Producer side;
    /// the closure must stay small.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.slot.lock().unwrap_or_else(|e| e.into_inner()));
    }

    /// Copy the latest value out. UI side.
    #[must_use]
    pub fn read(&self) -> T {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn publish_then_read_roundtrips() {
        let cell = SharedSnapshot::new(0u32);
        cell.publish(42);
        assert_eq!(cell.read(), 42);
        cell.update(|v| *v += 1);
        assert_eq!(cell.read(), 43);
    }

    #[test]
    fn cross_thread_publish_is_visible() {
        let cell = Arc::new(SharedSnapshot::new(String::new()));
        let producer = {
            let cell = Arc::clone(&cell);
            thread::spawn(move || cell.publish("ready".into()))
        };
        producer.join().unwrap();
        assert_eq!(cell.read(), "ready");
    }
}
