// Adapters layer: concrete `ConferenceStore` implementations.

pub mod json_store;
pub mod memory_store;
