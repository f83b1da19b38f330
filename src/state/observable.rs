use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned by [`Observable::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Value holder that notifies subscribers on every mutation
///
/// Listeners run synchronously on the mutating thread, after the write lock
/// has been released, so a listener may read the value again.
pub struct Observable<T: Clone + Send + Sync + 'static> {
    value: RwLock<T>,
    listeners: Mutex<Vec<(SubscriptionId, Listener<T>)>>,
    next_id: AtomicU64,
    watch: watch::Sender<T>,
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    pub fn new(initial: T) -> Self {
        let (watch, _) = watch::channel(initial.clone());
        Self {
            value: RwLock::new(initial),
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            watch,
        }
    }

    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Read through a closure without cloning the whole value
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    pub fn set(&self, value: T) {
        self.update(|current| *current = value);
    }

    /// Mutate in place and notify every listener with the new value
    pub fn update<R>(&self, mutate: impl FnOnce(&mut T) -> R) -> R {
        let (result, snapshot) = {
            let mut value = self.value.write();
            let result = mutate(&mut value);
            (result, value.clone())
        };

        let listeners: Vec<Listener<T>> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(&snapshot);
        }

        self.watch.send_replace(snapshot);
        result
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(i, _)| *i != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Async view of the latest value
    pub fn watch(&self) -> watch::Receiver<T> {
        self.watch.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_listeners_notified_synchronously() {
        let observable = Arc::new(Observable::new(0u32));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = Arc::clone(&seen);
        observable.subscribe(move |v| s.lock().push(*v));

        observable.set(1);
        observable.update(|v| *v += 10);
        assert_eq!(*seen.lock(), vec![1, 11]);
    }

    #[test]
    fn test_listener_may_read_value() {
        let observable = Arc::new(Observable::new(String::from("a")));
        let reads = Arc::new(AtomicUsize::new(0));

        let o = Arc::clone(&observable);
        let r = Arc::clone(&reads);
        observable.subscribe(move |_| {
            assert_eq!(o.get(), "b");
            r.fetch_add(1, Ordering::SeqCst);
        });

        observable.set("b".to_string());
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let observable = Observable::new(0u32);
        let calls = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&calls);
        let id = observable.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        observable.set(1);
        assert!(observable.unsubscribe(id));
        assert!(!observable.unsubscribe(id));
        observable.set(2);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(observable.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_watch_sees_latest_value() {
        let observable = Observable::new(0u32);
        let mut rx = observable.watch();
        observable.set(7);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 7);
    }
}
