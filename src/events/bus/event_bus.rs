// events/bus/event_bus.rs
//
// Core event bus implementation.
//
// DESIGN PRINCIPLES:
// 1. Synchronous - handlers execute immediately in subscription order
// 2. Observable - every emission is logged
// 3. Type-safe - events are strongly typed
// 4. A panicking handler never takes the emitter down

use std::any::{Any, TypeId};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, error};

use crate::events::types::DomainEvent;

/// Number of emissions kept in the in-memory log
const EVENT_LOG_CAPACITY: usize = 256;

/// Type-erased event handler function
type EventHandler = Box<dyn Fn(&dyn Any) + Send + Sync>;

/// The Event Bus
///
/// Services emit facts here (entry written, import committed, ...) and
/// embedding code subscribes without the services knowing about it.
pub struct EventBus {
    handlers: Arc<RwLock<HashMap<TypeId, Vec<EventHandler>>>>,
    event_log: Arc<RwLock<VecDeque<EventLogEntry>>>,
}

/// A logged event for debugging
#[derive(Debug, Clone)]
pub struct EventLogEntry {
    pub event_type: String,
    pub event_id: String,
    pub occurred_at: String,
    pub handler_count: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
            event_log: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    /// Subscribe to a specific event type
    ///
    /// Handlers are executed in the order they are subscribed.
    ///
    /// Example:
    /// ```ignore
    /// bus.subscribe::<LibraryEntryUpserted, _>(|event| {
    ///     log::info!("entry {} written", event.entry_id);
    /// });
    /// ```
    pub fn subscribe<E, F>(&self, handler: F)
    where
        E: DomainEvent + 'static,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let type_id = TypeId::of::<E>();

        let wrapped: EventHandler = Box::new(move |event_any: &dyn Any| {
            if let Some(event) = event_any.downcast_ref::<E>() {
                handler(event);
            } else {
                error!(
                    "Failed to downcast event in handler for {}",
                    std::any::type_name::<E>()
                );
            }
        });

        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(type_id)
            .or_default()
            .push(wrapped);
    }

    /// Emit an event: log it, then run every handler for its type.
    pub fn emit<E>(&self, event: E)
    where
        E: DomainEvent + 'static,
    {
        let type_id = TypeId::of::<E>();
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let event_handlers = handlers.get(&type_id);
        let handler_count = event_handlers.map(|h| h.len()).unwrap_or(0);

        let log_entry = EventLogEntry {
            event_type: event.event_type().to_string(),
            event_id: event.event_id().to_string(),
            occurred_at: event.occurred_at().to_rfc3339(),
            handler_count,
        };
        debug!(
            "[EVENT] {} (id: {}) | {} handlers",
            log_entry.event_type, log_entry.event_id, log_entry.handler_count
        );
        {
            let mut log = self.event_log.write().unwrap_or_else(PoisonError::into_inner);
            if log.len() == EVENT_LOG_CAPACITY {
                log.pop_front();
            }
            log.push_back(log_entry);
        }

        if let Some(handlers) = event_handlers {
            for (idx, handler) in handlers.iter().enumerate() {
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    handler(&event as &dyn Any);
                }));

                if let Err(e) = result {
                    error!(
                        "Handler {} for {} panicked: {:?}",
                        idx,
                        event.event_type(),
                        e
                    );
                }
            }
        }
    }

    /// Most recent emissions, oldest first
    pub fn get_event_log(&self) -> Vec<EventLogEntry> {
        self.event_log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn subscriber_count<E>(&self) -> usize
    where
        E: 'static,
    {
        let type_id = TypeId::of::<E>();
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .map(|h| h.len())
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// Clones share handlers and log
impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
            event_log: Arc::clone(&self.event_log),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WatchStatus;
    use crate::events::types::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn upserted(id: &str) -> LibraryEntryUpserted {
        LibraryEntryUpserted::new(id.to_string(), WatchStatus::Watching)
    }

    #[test]
    fn test_subscribe_and_emit() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        bus.subscribe::<LibraryEntryUpserted, _>(move |_event| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(upserted("1"));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_multiple_handlers_execute_in_order() {
        let bus = EventBus::new();
        let sequence = Arc::new(Mutex::new(Vec::new()));

        for n in 1..=3 {
            let seq = Arc::clone(&sequence);
            bus.subscribe::<LibraryEntryRemoved, _>(move |_| {
                seq.lock().unwrap().push(n);
            });
        }

        bus.emit(LibraryEntryRemoved::new("1".to_string()));

        assert_eq!(*sequence.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_event_log_records_emissions() {
        let bus = EventBus::new();

        bus.emit(upserted("1"));
        bus.emit(FavoriteChanged::new("1".to_string(), true));

        let log = bus.get_event_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].event_type, "LibraryEntryUpserted");
        assert_eq!(log[1].event_type, "FavoriteChanged");
    }

    #[test]
    fn test_event_log_is_bounded() {
        let bus = EventBus::new();
        for i in 0..(EVENT_LOG_CAPACITY + 10) {
            bus.emit(upserted(&i.to_string()));
        }
        assert_eq!(bus.get_event_log().len(), EVENT_LOG_CAPACITY);
    }

    #[test]
    fn test_subscriber_count() {
        let bus = EventBus::new();

        assert_eq!(bus.subscriber_count::<LibraryEntryUpserted>(), 0);

        bus.subscribe::<LibraryEntryUpserted, _>(|_| {});
        bus.subscribe::<LibraryEntryUpserted, _>(|_| {});
        assert_eq!(bus.subscriber_count::<LibraryEntryUpserted>(), 2);

        assert_eq!(bus.subscriber_count::<LibraryEntryRemoved>(), 0);
    }

    #[test]
    fn test_handler_panic_doesnt_break_bus() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        bus.subscribe::<LibraryEntryUpserted, _>(|_| {
            panic!("Intentional panic");
        });

        let counter_clone = Arc::clone(&counter);
        bus.subscribe::<LibraryEntryUpserted, _>(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(upserted("1"));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
