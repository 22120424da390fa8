use std::sync::Arc;
use parking_lot::Mutex;
use ahash::AHashMap;

/// Synchronous event bus for grid notifications
///
/// Handlers run on the publishing thread, in subscription order, before
/// `publish` returns.
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<std::any::TypeId, Vec<Box<dyn EventHandler>>>>>,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Grid events, published after every recompute
pub mod events {
    use super::Event;
    use crate::order::SortDirection;

    /// The accepted-value set of one or more columns changed
    #[derive(Debug, Clone)]
    pub struct FiltersChanged {
        pub table: String,
        pub filtered_columns: Vec<String>,
        pub visible_rows: usize,
    }

    /// The multi-column sort changed
    #[derive(Debug, Clone)]
    pub struct SortChanged {
        pub table: String,
        pub sort: Vec<(String, SortDirection)>,
    }

    /// The current view changed (order, visibility or identity)
    #[derive(Debug, Clone)]
    pub struct ViewChanged {
        pub table: String,
        pub view_name: String,
        pub is_custom: bool,
    }

    /// The set of hidden columns changed
    #[derive(Debug, Clone)]
    pub struct HiddenColumnsChanged {
        pub table: String,
        pub hidden: Vec<String>,
    }

    /// Summary values were recomputed
    #[derive(Debug, Clone)]
    pub struct SummaryChanged {
        pub table: String,
    }

    /// The data source was replaced wholesale
    #[derive(Debug, Clone)]
    pub struct DataReset {
        pub table: String,
        pub row_count: usize,
    }

    /// A single cell was written
    #[derive(Debug, Clone)]
    pub struct CellChanged {
        pub table: String,
        pub row_key: u64,
        pub column: String,
    }

    /// Rows were removed from the source
    #[derive(Debug, Clone)]
    pub struct RowsRemoved {
        pub table: String,
        pub row_keys: Vec<u64>,
    }

    /// The set of selected rows changed
    #[derive(Debug, Clone)]
    pub struct SelectionChanged {
        pub table: String,
        pub selected: usize,
    }

    /// The saved view list changed
    #[derive(Debug, Clone)]
    pub struct SavedViewsChanged {
        pub table: String,
        pub names: Vec<String>,
    }

    // Implement Event trait for all event types
    macro_rules! impl_event {
        ($($t:ty),*) => {
            $(
                impl Event for $t {
                    fn as_any(&self) -> &dyn std::any::Any {
                        self
                    }
                }
            )*
        }
    }

    impl_event!(
        FiltersChanged,
        SortChanged,
        ViewChanged,
        HiddenColumnsChanged,
        SummaryChanged,
        DataReset,
        CellChanged,
        RowsRemoved,
        SelectionChanged,
        SavedViewsChanged
    );
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();
        handlers.entry(type_id).or_insert_with(Vec::new).push(handler);
    }

    /// Subscribe a closure that receives the concrete event type
    pub fn subscribe_fn<E, F>(&self, mut f: F)
    where
        E: Event,
        F: FnMut(&E) + Send + Sync + 'static,
    {
        self.subscribe::<E>(handler_from_fn(move |event| {
            if let Some(event) = event.as_any().downcast_ref::<E>() {
                f(event);
            }
        }));
    }

    /// Publish an event
    pub fn publish<E: Event>(&self, event: E) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();

        if let Some(event_handlers) = handlers.get_mut(&type_id) {
            for handler in event_handlers.iter_mut() {
                handler.handle(&event);
            }
        }
    }

    /// Number of handlers registered for `E`
    pub fn handler_count<E: Event>(&self) -> usize {
        self.handlers
            .lock()
            .get(&std::any::TypeId::of::<E>())
            .map(|h| h.len())
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper struct for creating event handlers from closures
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::events::{DataReset, SummaryChanged};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_publish_reaches_typed_subscribers_only() {
        let bus = EventBus::new();
        let resets = Arc::new(AtomicUsize::new(0));
        let counter = resets.clone();
        bus.subscribe_fn::<DataReset, _>(move |event| {
            counter.fetch_add(event.row_count, Ordering::SeqCst);
        });

        bus.publish(DataReset { table: "t".into(), row_count: 3 });
        bus.publish(SummaryChanged { table: "t".into() });

        assert_eq!(resets.load(Ordering::SeqCst), 3);
        assert_eq!(bus.handler_count::<DataReset>(), 1);
        assert_eq!(bus.handler_count::<SummaryChanged>(), 0);
    }
}
