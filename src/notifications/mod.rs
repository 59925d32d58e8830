//! Notifications module
//!
//! In-process pub/sub for reservation lifecycle events. Event publication
//! is fire-and-forget; delivery transports live outside this service.

pub mod event_bus;
pub mod events;

pub use event_bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use events::{Event, EventMessage};
