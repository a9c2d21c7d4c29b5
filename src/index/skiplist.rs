use std::sync::Arc;

use bytes::Bytes;
use crossbeam_skiplist::SkipMap;

use crate::{data::log_record::LogRecordPos, errors::Result, option::IteratorOptions};

use super::{IndexIterator, Indexer};

/// Lock-free ordered index built on a concurrent skip list.
pub struct SkipList {
  skl: Arc<SkipMap<Vec<u8>, LogRecordPos>>,
}

impl SkipList {
  pub fn new() -> Self {
    Self {
      skl: Arc::new(SkipMap::new()),
    }
  }
}

impl Default for SkipList {
  fn default() -> Self {
    Self::new()
  }
}

impl Indexer for SkipList {
  fn put(&self, key: Vec<u8>, pos: LogRecordPos) -> bool {
    self.skl.insert(key, pos);
    true
  }

  fn get(&self, key: Vec<u8>) -> Option<LogRecordPos> {
    self.skl.get(&key).map(|entry| *entry.value())
  }

  fn delete(&self, key: Vec<u8>) -> bool {
    self.skl.remove(&key).is_some()
  }

  fn size(&self) -> usize {
    self.skl.len()
  }

  fn list_keys(&self) -> Result<Vec<Bytes>> {
    let keys = self
      .skl
      .iter()
      .map(|entry| Bytes::copy_from_slice(entry.key()))
      .collect();
    Ok(keys)
  }

  fn iterator(&self, options: IteratorOptions) -> Box<dyn IndexIterator> {
    let mut items: Vec<(Vec<u8>, LogRecordPos)> = self
      .skl
      .iter()
      .map(|entry| (entry.key().clone(), *entry.value()))
      .collect();
    if options.reverse {
      items.reverse();
    }
    Box::new(SkipListIterator {
      items,
      curr_index: 0,
      options,
    })
  }
}

/// Iterator over a materialized snapshot of the skip list.
pub struct SkipListIterator {
  items: Vec<(Vec<u8>, LogRecordPos)>,
  curr_index: usize,
  options: IteratorOptions,
}

impl IndexIterator for SkipListIterator {
  fn rewind(&mut self) {
    self.curr_index = 0;
  }

  fn seek(&mut self, key: Vec<u8>) {
    self.curr_index = match self.items.binary_search_by(|(x, _)| {
      if self.options.reverse {
        x.cmp(&key).reverse()
      } else {
        x.cmp(&key)
      }
    }) {
      Ok(equal_val) => equal_val,
      Err(insert_val) => insert_val,
    };
  }

  fn next(&mut self) -> Option<(&Vec<u8>, &LogRecordPos)> {
    if self.curr_index >= self.items.len() {
      return None;
    }

    while let Some(item) = self.items.get(self.curr_index) {
      self.curr_index += 1;
      let prefix = &self.options.prefix;
      if prefix.is_empty() || item.0.starts_with(prefix) {
        return Some((&item.0, &item.1));
      }
    }
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pos(file_id: u32, offset: u64) -> LogRecordPos {
    LogRecordPos { file_id, offset }
  }

  #[test]
  fn test_skiplist_put_get() {
    let skl = SkipList::new();
    assert!(skl.put(b"abcd".to_vec(), pos(1, 10)));
    assert!(skl.put(b"abcd".to_vec(), pos(2, 20)));
    assert_eq!(skl.get(b"abcd".to_vec()).unwrap(), pos(2, 20));
    assert!(skl.get(b"missing".to_vec()).is_none());
  }

  #[test]
  fn test_skiplist_delete() {
    let skl = SkipList::new();
    skl.put(b"abcd".to_vec(), pos(1, 10));
    assert!(skl.delete(b"abcd".to_vec()));
    assert!(!skl.delete(b"abcd".to_vec()));
    assert!(skl.get(b"abcd".to_vec()).is_none());
  }

  #[test]
  fn test_skiplist_size_and_list_keys() {
    let skl = SkipList::new();
    assert_eq!(skl.size(), 0);
    skl.put(b"ccde".to_vec(), pos(1, 10));
    skl.put(b"aacd".to_vec(), pos(1, 20));
    skl.put(b"bbae".to_vec(), pos(1, 30));
    assert_eq!(skl.size(), 3);

    let keys = skl.list_keys().unwrap();
    assert_eq!(
      keys,
      vec![
        Bytes::from("aacd".as_bytes()),
        Bytes::from("bbae".as_bytes()),
        Bytes::from("ccde".as_bytes()),
      ]
    );
  }

  #[test]
  fn test_skiplist_iterator() {
    let skl = SkipList::new();
    skl.put(b"ccde".to_vec(), pos(1, 10));
    skl.put(b"aacd".to_vec(), pos(1, 20));
    skl.put(b"bbae".to_vec(), pos(1, 30));

    let mut iter = skl.iterator(IteratorOptions::default());
    assert_eq!(iter.next().unwrap().0, &b"aacd".to_vec());
    assert_eq!(iter.next().unwrap().0, &b"bbae".to_vec());
    assert_eq!(iter.next().unwrap().0, &b"ccde".to_vec());
    assert!(iter.next().is_none());

    let mut opts = IteratorOptions::default();
    opts.reverse = true;
    let mut iter = skl.iterator(opts);
    iter.seek(b"bz".to_vec());
    assert_eq!(iter.next().unwrap().0, &b"bbae".to_vec());
  }
}
