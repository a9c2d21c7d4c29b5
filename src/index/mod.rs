pub mod btree;
pub mod skiplist;

use bytes::Bytes;

use crate::{
  data::log_record::LogRecordPos,
  errors::Result,
  option::{IndexType, IteratorOptions},
};

pub trait Indexer: Sync + Send {
  /// Stores a key's position, overwriting any previous one. Returns false
  /// only when the backing store refuses the update.
  fn put(&self, key: Vec<u8>, pos: LogRecordPos) -> bool;

  /// Retrieves a key's position from the index.
  fn get(&self, key: Vec<u8>) -> Option<LogRecordPos>;

  /// Deletes a key's position from the index. Returns true iff an entry
  /// existed.
  fn delete(&self, key: Vec<u8>) -> bool;

  /// Number of live entries.
  fn size(&self) -> usize;

  fn list_keys(&self) -> Result<Vec<Bytes>>;

  /// Creates an iterator over a snapshot of the index taken now.
  /// * `options` - Configuration options for the iterator
  fn iterator(&self, options: IteratorOptions) -> Box<dyn IndexIterator>;
}

/// Creates a new indexer based on the specified index type.
pub fn new_indexer(index_type: &IndexType) -> Box<dyn Indexer> {
  match *index_type {
    IndexType::BTree => Box::new(btree::BTree::new()),
    IndexType::SkipList => Box::new(skiplist::SkipList::new()),
    IndexType::ART => unimplemented!("adaptive radix tree index"),
  }
}

/// Provides methods for iterating over key-position pairs in the index.
pub trait IndexIterator: Sync + Send {
  fn rewind(&mut self);

  fn seek(&mut self, key: Vec<u8>);

  fn next(&mut self) -> Option<(&Vec<u8>, &LogRecordPos)>;
}
