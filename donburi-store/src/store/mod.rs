mod trait_store;
mod types;

pub use trait_store::{into_resource, ResourceStore, StoreError};
pub use types::{resource_id, ListFilter, Resource, ID_FIELD, TENANT_FIELD};
