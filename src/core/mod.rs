//! Configuration snapshot, store, and file parsing.

mod loader;
mod snapshot;
mod store;

pub use loader::SnapshotLoader;
pub use snapshot::ConfigSnapshot;
pub use store::ConfigStore;
