//! Ember-KV: a Bitcask-style key-value storage engine.
//!
//! Ember-KV keeps all data in an append-only log of numbered data files and
//! maps every live key to the disk position of its newest record through an
//! in-memory ordered index. Writes are a single append, reads are a single
//! positional fetch, and reopening a directory replays the log to rebuild
//! the index.
//!
//! # Features
//!
//! * Point puts, gets and deletes with one disk access each
//! * Durability bounded by an explicit sync policy
//! * Size-bounded data files with automatic rotation
//! * Crash recovery with CRC verification of every record
//! * Ordered key iteration with prefix and reverse options
//! * Interchangeable in-memory index implementations
//!
//! # Basic Usage
//!
//! ```
//! use bytes::Bytes;
//! use ember_kv::{db::Engine, option::Options};
//!
//! // Create a default engine instance
//! let opts = Options::default();
//! let engine = Engine::open(opts).expect("failed to open ember-kv engine");
//!
//! // Store a key-value pair
//! let key = Bytes::from(b"hello".to_vec());
//! let value = Bytes::from(b"world".to_vec());
//! engine.put(key.clone(), value.clone()).expect("failed to put");
//!
//! // Retrieve the value
//! let retrieved = engine.get(key.clone()).expect("failed to get");
//! assert_eq!(retrieved, value);
//!
//! // Delete the key
//! engine.delete(key).expect("failed to delete");
//! ```

mod data;

mod fio;
mod index;
mod iterator;

pub mod db;
pub mod errors;
pub mod option;
pub mod util;
