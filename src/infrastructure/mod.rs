//! Adapters behind the domain ports: storage backends, the two gateway
//! transports, and notification sinks.

pub mod in_memory;
pub mod notify;
pub mod razorpay;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod simulated;
