//! Object storage gateway: an S3-compatible client plus the key and URL
//! conventions the platform uses on top of it.

pub mod client;
pub mod keys;
pub mod sigv4;

pub use client::ObjectStore;
