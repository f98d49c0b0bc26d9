#![forbid(unsafe_code)]

pub mod memory;
pub mod store;

pub use crate::memory::MemoryStore;
pub use crate::store::{into_resource, ListFilter, Resource, ResourceStore, StoreError};
