//! Signal/slot multicast notification.
//!
//! A [`Signal`] is an ordered list of connected callbacks. Widgets expose
//! signals as public fields (`value_changed`, `drag_started`, ...) and
//! interested parties connect closures to them.
//!
//! # Reentrancy
//!
//! Emission is snapshot-based: the connected slots are copied out under the
//! lock, the lock is released, and each callback is invoked only after
//! re-checking that its connection still exists. A callback may therefore
//! disconnect itself, disconnect any other slot, connect new slots (which do
//! not see the in-flight emission), or destroy the object that owns the
//! signal. No slot is skipped or invoked twice within one emission.
//!
//! # Example
//!
//! ```ignore
//! let signal: Signal<i32> = Signal::new();
//! let id = signal.connect(|v| println!("value: {v}"));
//! signal.emit(42);
//! signal.disconnect(id);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Identifies a single signal connection.
    pub struct ConnectionId;
}

struct Connection<Args> {
    callback: Arc<dyn Fn(Args) + Send + Sync>,
    blocked: bool,
}

struct SignalInner<Args> {
    connections: SlotMap<ConnectionId, Connection<Args>>,
    blocked: bool,
}

/// A multicast signal carrying values of type `Args`.
///
/// `Args` must be `Clone` because each connected slot receives its own copy
/// of the emitted value. Use a tuple for multi-argument signals and `()` for
/// argument-free notifications.
pub struct Signal<Args: Clone = ()> {
    inner: Arc<Mutex<SignalInner<Args>>>,
}

impl<Args: Clone> Signal<Args> {
    /// Create a signal with no connections.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SignalInner {
                connections: SlotMap::with_key(),
                blocked: false,
            })),
        }
    }

    /// Connect a callback. Returns an id usable with [`disconnect`].
    ///
    /// [`disconnect`]: Signal::disconnect
    pub fn connect<F>(&self, callback: F) -> ConnectionId
    where
        F: Fn(Args) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        inner.connections.insert(Connection {
            callback: Arc::new(callback),
            blocked: false,
        })
    }

    /// Remove a connection. Returns whether it existed.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.inner.lock().connections.remove(id).is_some()
    }

    /// Remove every connection.
    pub fn disconnect_all(&self) {
        self.inner.lock().connections.clear();
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.inner.lock().connections.len()
    }

    /// Whether the given connection still exists.
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.inner.lock().connections.contains_key(id)
    }

    /// Block or unblock a single connection. Returns false if unknown.
    pub fn set_connection_blocked(&self, id: ConnectionId, blocked: bool) -> bool {
        let mut inner = self.inner.lock();
        match inner.connections.get_mut(id) {
            Some(conn) => {
                conn.blocked = blocked;
                true
            }
            None => false,
        }
    }

    /// Block or unblock the whole signal. While blocked, `emit` is a no-op.
    pub fn set_blocked(&self, blocked: bool) {
        self.inner.lock().blocked = blocked;
    }

    /// Whether the whole signal is blocked.
    pub fn is_blocked(&self) -> bool {
        self.inner.lock().blocked
    }

    /// Invoke every connected, unblocked slot with a copy of `args`.
    pub fn emit(&self, args: Args) {
        // Snapshot the slots, then drop the lock so callbacks are free to
        // connect, disconnect, or emit again.
        let snapshot: Vec<(ConnectionId, Arc<dyn Fn(Args) + Send + Sync>)> = {
            let inner = self.inner.lock();
            if inner.blocked {
                return;
            }
            inner
                .connections
                .iter()
                .filter(|(_, conn)| !conn.blocked)
                .map(|(id, conn)| (id, Arc::clone(&conn.callback)))
                .collect()
        };

        for (id, callback) in snapshot {
            // A previous callback may have disconnected this one.
            let still_connected = {
                let inner = self.inner.lock();
                inner.connections.contains_key(id) && !inner.blocked
            };
            if still_connected {
                callback(args.clone());
            }
        }
    }
}

impl<Args: Clone> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: Clone> Clone for Signal<Args> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<Args: Clone> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connection_count())
            .finish()
    }
}

/// RAII guard that disconnects a connection when dropped.
pub struct ConnectionGuard<Args: Clone = ()> {
    signal: Signal<Args>,
    id: Option<ConnectionId>,
}

impl<Args: Clone> ConnectionGuard<Args> {
    /// Tie a connection's lifetime to this guard.
    pub fn new(signal: &Signal<Args>, id: ConnectionId) -> Self {
        Self {
            signal: signal.clone(),
            id: Some(id),
        }
    }

    /// Release the connection without disconnecting it.
    pub fn release(mut self) -> ConnectionId {
        self.id.take().unwrap_or_default()
    }
}

impl<Args: Clone> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.signal.disconnect(id);
        }
    }
}

static_assertions::assert_impl_all!(Signal<i32>: Send, Sync);
static_assertions::assert_impl_all!(Signal<()>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn emit_reaches_all_connections() {
        let signal: Signal<i32> = Signal::new();
        let count = Arc::new(AtomicI32::new(0));

        for _ in 0..3 {
            let count = Arc::clone(&count);
            signal.connect(move |v| {
                count.fetch_add(v, Ordering::SeqCst);
            });
        }

        signal.emit(2);
        assert_eq!(count.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn disconnect_stops_delivery() {
        let signal: Signal<()> = Signal::new();
        let count = Arc::new(AtomicI32::new(0));

        let count2 = Arc::clone(&count);
        let id = signal.connect(move |_| {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        signal.emit(());
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callback_can_disconnect_itself() {
        let signal: Signal<()> = Signal::new();
        let count = Arc::new(AtomicI32::new(0));

        let id_slot: Arc<Mutex<Option<ConnectionId>>> = Arc::new(Mutex::new(None));
        let id_slot2 = Arc::clone(&id_slot);
        let signal2 = signal.clone();
        let count2 = Arc::clone(&count);
        let id = signal.connect(move |_| {
            count2.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *id_slot2.lock() {
                signal2.disconnect(id);
            }
        });
        *id_slot.lock() = Some(id);

        signal.emit(());
        signal.emit(());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn callback_can_disconnect_a_later_slot() {
        let signal: Signal<()> = Signal::new();
        let count = Arc::new(AtomicI32::new(0));

        // First slot disconnects the second before it runs.
        let victim: Arc<Mutex<Option<ConnectionId>>> = Arc::new(Mutex::new(None));
        let victim2 = Arc::clone(&victim);
        let signal2 = signal.clone();
        signal.connect(move |_| {
            if let Some(id) = *victim2.lock() {
                signal2.disconnect(id);
            }
        });

        let count2 = Arc::clone(&count);
        let id = signal.connect(move |_| {
            count2.fetch_add(1, Ordering::SeqCst);
        });
        *victim.lock() = Some(id);

        signal.emit(());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn connections_made_during_emit_miss_that_emit() {
        let signal: Signal<()> = Signal::new();
        let count = Arc::new(AtomicI32::new(0));

        let signal2 = signal.clone();
        let count2 = Arc::clone(&count);
        signal.connect(move |_| {
            let count3 = Arc::clone(&count2);
            signal2.connect(move |_| {
                count3.fetch_add(1, Ordering::SeqCst);
            });
        });

        signal.emit(());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        // The new slot fires on the next pass.
        signal.emit(());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn blocked_connection_is_skipped() {
        let signal: Signal<()> = Signal::new();
        let count = Arc::new(AtomicI32::new(0));

        let count2 = Arc::clone(&count);
        let id = signal.connect(move |_| {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        signal.set_connection_blocked(id, true);
        signal.emit(());
        signal.set_connection_blocked(id, false);
        signal.emit(());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn blocked_signal_emits_nothing() {
        let signal: Signal<()> = Signal::new();
        let count = Arc::new(AtomicI32::new(0));

        let count2 = Arc::clone(&count);
        signal.connect(move |_| {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        signal.set_blocked(true);
        signal.emit(());
        signal.set_blocked(false);
        signal.emit(());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn guard_disconnects_on_drop() {
        let signal: Signal<()> = Signal::new();
        let id = signal.connect(|_| {});
        {
            let _guard = ConnectionGuard::new(&signal, id);
            assert_eq!(signal.connection_count(), 1);
        }
        assert_eq!(signal.connection_count(), 0);
    }
}
