use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::{
  db::Engine,
  errors::Result,
  index::IndexIterator,
  option::IteratorOptions,
};

/// User-facing iterator over a snapshot of the live keyspace, yielding keys
/// with their current values.
pub struct Iterator<'a> {
  index_iter: Arc<RwLock<Box<dyn IndexIterator>>>,
  engine: &'a Engine,
}

impl Engine {
  /// Creates an iterator over the engine's live entries. The snapshot is
  /// taken now; later writes are not visible through it.
  pub fn iter(&self, options: IteratorOptions) -> Result<Iterator> {
    self.check_open()?;
    Ok(Iterator {
      index_iter: Arc::new(RwLock::new(self.index.iterator(options))),
      engine: self,
    })
  }

  /// Returns every live key in ascending order.
  pub fn list_keys(&self) -> Result<Vec<Bytes>> {
    self.check_open()?;
    self.index.list_keys()
  }

  /// Calls `f` on every live key-value pair in ascending key order until it
  /// returns false. A read failure stops the walk and surfaces.
  pub fn fold<F>(&self, f: F) -> Result<()>
  where
    F: Fn(Bytes, Bytes) -> bool,
  {
    self.check_open()?;
    let mut index_iter = self.index.iterator(IteratorOptions::default());
    while let Some((key, pos)) = index_iter.next() {
      let value = self.get_value_by_position(pos)?;
      if !f(Bytes::copy_from_slice(key), value) {
        break;
      }
    }
    Ok(())
  }
}

impl Iterator<'_> {
  /// Back to the first entry of the snapshot.
  pub fn rewind(&self) {
    let mut index_iter = self.index_iter.write();
    index_iter.rewind();
  }

  /// Positions on the first entry whose key is >= `key` (<= when reversed).
  pub fn seek(&self, key: Vec<u8>) {
    let mut index_iter = self.index_iter.write();
    index_iter.seek(key);
  }

  /// Returns the next key-value pair, fetching the value from its data file.
  /// A read failure surfaces instead of ending the iteration.
  pub fn next(&self) -> Result<Option<(Bytes, Bytes)>> {
    let mut index_iter = self.index_iter.write();
    if let Some((key, pos)) = index_iter.next() {
      let value = self.engine.get_value_by_position(pos)?;
      return Ok(Some((Bytes::copy_from_slice(key), value)));
    }
    Ok(None)
  }
}

#[cfg(test)]
mod tests {
  use std::{fs, path::PathBuf};

  use super::*;
  use crate::{errors::Errors, option::Options};

  fn test_engine(name: &str) -> (Engine, PathBuf) {
    let mut opts = Options::default();
    opts.dir_path = PathBuf::from(format!("/tmp/ember-kv-iter-{}", name));
    let _ = fs::remove_dir_all(&opts.dir_path);
    let dir = opts.dir_path.clone();
    (Engine::open(opts).expect("failed to open engine"), dir)
  }

  #[test]
  fn test_iterator_empty() {
    let (engine, dir) = test_engine("empty");
    let iter = engine.iter(IteratorOptions::default()).unwrap();
    assert!(iter.next().unwrap().is_none());

    drop(engine);
    fs::remove_dir_all(dir).unwrap();
  }

  #[test]
  fn test_iterator_forward_and_reverse() {
    let (engine, dir) = test_engine("order");
    engine.put(Bytes::from("ccde"), Bytes::from("v3")).unwrap();
    engine.put(Bytes::from("aacd"), Bytes::from("v1")).unwrap();
    engine.put(Bytes::from("bbae"), Bytes::from("v2")).unwrap();

    let iter = engine.iter(IteratorOptions::default()).unwrap();
    assert_eq!(
      iter.next().unwrap().unwrap(),
      (Bytes::from("aacd"), Bytes::from("v1"))
    );
    assert_eq!(
      iter.next().unwrap().unwrap(),
      (Bytes::from("bbae"), Bytes::from("v2"))
    );
    assert_eq!(
      iter.next().unwrap().unwrap(),
      (Bytes::from("ccde"), Bytes::from("v3"))
    );
    assert!(iter.next().unwrap().is_none());

    let mut opts = IteratorOptions::default();
    opts.reverse = true;
    let iter = engine.iter(opts).unwrap();
    assert_eq!(iter.next().unwrap().unwrap().0, Bytes::from("ccde"));
    assert_eq!(iter.next().unwrap().unwrap().0, Bytes::from("bbae"));
    assert_eq!(iter.next().unwrap().unwrap().0, Bytes::from("aacd"));

    drop(engine);
    fs::remove_dir_all(dir).unwrap();
  }

  #[test]
  fn test_iterator_seek_and_rewind() {
    let (engine, dir) = test_engine("seek");
    engine.put(Bytes::from("ccde"), Bytes::from("v3")).unwrap();
    engine.put(Bytes::from("aacd"), Bytes::from("v1")).unwrap();
    engine.put(Bytes::from("bbae"), Bytes::from("v2")).unwrap();

    let iter = engine.iter(IteratorOptions::default()).unwrap();
    iter.seek(b"b".to_vec());
    assert_eq!(iter.next().unwrap().unwrap().0, Bytes::from("bbae"));

    iter.rewind();
    assert_eq!(iter.next().unwrap().unwrap().0, Bytes::from("aacd"));

    drop(engine);
    fs::remove_dir_all(dir).unwrap();
  }

  #[test]
  fn test_iterator_prefix() {
    let (engine, dir) = test_engine("prefix");
    engine.put(Bytes::from("user:1"), Bytes::from("a")).unwrap();
    engine.put(Bytes::from("user:2"), Bytes::from("b")).unwrap();
    engine.put(Bytes::from("order:1"), Bytes::from("c")).unwrap();

    let mut opts = IteratorOptions::default();
    opts.prefix = b"user:".to_vec();
    let iter = engine.iter(opts).unwrap();
    assert_eq!(iter.next().unwrap().unwrap().0, Bytes::from("user:1"));
    assert_eq!(iter.next().unwrap().unwrap().0, Bytes::from("user:2"));
    assert!(iter.next().unwrap().is_none());

    drop(engine);
    fs::remove_dir_all(dir).unwrap();
  }

  #[test]
  fn test_iterator_snapshot_isolation() {
    let (engine, dir) = test_engine("snapshot");
    engine.put(Bytes::from("aacd"), Bytes::from("v1")).unwrap();

    let iter = engine.iter(IteratorOptions::default()).unwrap();
    engine.put(Bytes::from("zzzz"), Bytes::from("v2")).unwrap();

    assert_eq!(iter.next().unwrap().unwrap().0, Bytes::from("aacd"));
    assert!(iter.next().unwrap().is_none());

    drop(engine);
    fs::remove_dir_all(dir).unwrap();
  }

  #[test]
  fn test_iterator_across_close_surfaces_error() {
    let (engine, dir) = test_engine("across-close");
    engine.put(Bytes::from("aacd"), Bytes::from("v1")).unwrap();

    // closing drops the data file handles out from under the snapshot; the
    // next read reports that instead of panicking
    let iter = engine.iter(IteratorOptions::default()).unwrap();
    engine.close().unwrap();
    let res = iter.next();
    assert_eq!(Errors::DataFileNotFound, res.err().unwrap());

    drop(engine);
    fs::remove_dir_all(dir).unwrap();
  }

  #[test]
  fn test_list_keys() {
    let (engine, dir) = test_engine("list-keys");
    assert_eq!(engine.list_keys().unwrap().len(), 0);

    engine.put(Bytes::from("ccde"), Bytes::from("v3")).unwrap();
    engine.put(Bytes::from("aacd"), Bytes::from("v1")).unwrap();
    engine.put(Bytes::from("bbae"), Bytes::from("v2")).unwrap();

    let keys = engine.list_keys().unwrap();
    assert_eq!(
      keys,
      vec![
        Bytes::from("aacd"),
        Bytes::from("bbae"),
        Bytes::from("ccde"),
      ]
    );

    drop(engine);
    fs::remove_dir_all(dir).unwrap();
  }

  #[test]
  fn test_fold() {
    let (engine, dir) = test_engine("fold");
    engine.put(Bytes::from("ccde"), Bytes::from("v3")).unwrap();
    engine.put(Bytes::from("aacd"), Bytes::from("v1")).unwrap();
    engine.put(Bytes::from("bbae"), Bytes::from("v2")).unwrap();

    let seen = Arc::new(RwLock::new(Vec::new()));
    let seen2 = seen.clone();
    engine
      .fold(move |key, value| {
        seen2.write().push((key, value));
        true
      })
      .unwrap();
    assert_eq!(seen.read().len(), 3);
    assert_eq!(seen.read()[0].0, Bytes::from("aacd"));

    // returning false stops the walk
    let count = Arc::new(RwLock::new(0));
    let count2 = count.clone();
    engine
      .fold(move |_key, _value| {
        *count2.write() += 1;
        false
      })
      .unwrap();
    assert_eq!(*count.read(), 1);

    drop(engine);
    fs::remove_dir_all(dir).unwrap();
  }
}
