//! Typed seams over managed cloud primitives.
//!
//! The crate exposes the three building blocks the rest of the workspace
//! composes: a publish/subscribe [`Topic`] over a pluggable
//! [`NotificationTransport`], a [`KeyValueTable`] with in-memory and SQLite
//! implementations, and a recurring [`poll`] primitive that yields a lazy
//! stream while threading a continuation token between invocations.
//!
//! Delivery, ordering, deduplication, and retry guarantees belong to the
//! transport behind the seam, never to this layer.

pub mod memory;
pub mod poll;
pub mod table;
pub mod topic;

pub use memory::{DeliveryRecord, MemoryTransport};
pub use poll::{poll, PollBatch};
pub use table::{KeyValueTable, MemoryTable, SqliteTable, TableError};
pub use topic::{
    MessageHandler, NotificationTransport, Topic, TopicError, TopicHandle, TransportError,
};
