//! In-memory sample CRUD store

pub mod store;

pub use store::{SampleStore, StoreError};
