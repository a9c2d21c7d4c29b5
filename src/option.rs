use lazy_static::lazy_static;
use std::path::PathBuf;

lazy_static! {
  pub static ref DEFAULT_DIR_PATH: PathBuf = std::env::temp_dir().join("ember-kv");
}

#[derive(Debug, Clone)]
pub struct Options {
  /// Directory holding the data files. Must not be empty.
  pub dir_path: PathBuf,

  /// Maximum bytes per data file before the active file is rotated. Must be
  /// greater than zero.
  pub data_file_size: u64,

  /// Fsync after every append.
  pub sync_writes: bool,

  /// Fsync after roughly this many appended bytes. Zero disables the
  /// threshold.
  pub bytes_per_sync: usize,

  pub index_type: IndexType,

  /// Replay data files through read-only memory maps at startup.
  pub mmap_at_startup: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexType {
  BTree,

  SkipList,

  /// Adaptive radix tree. Declared, not implemented yet.
  ART,
}

impl Default for Options {
  fn default() -> Self {
    Self {
      dir_path: DEFAULT_DIR_PATH.clone(),
      data_file_size: 256 * 1024 * 1024, // 256MB
      sync_writes: false,
      bytes_per_sync: 0,
      index_type: IndexType::BTree,
      mmap_at_startup: true,
    }
  }
}

pub struct IteratorOptions {
  /// Only visit keys starting with this prefix. Empty visits everything.
  pub prefix: Vec<u8>,
  pub reverse: bool,
}

#[allow(clippy::derivable_impls)]
impl Default for IteratorOptions {
  fn default() -> Self {
    Self {
      prefix: Default::default(),
      reverse: false,
    }
  }
}

/// Options for the write-batch feature. Batches are not implemented yet; the
/// configuration surface is declared ahead of them.
pub struct WriteBatchOptions {
  pub max_batch_num: usize,

  pub sync_writes: bool,
}

impl Default for WriteBatchOptions {
  fn default() -> Self {
    Self {
      max_batch_num: 10000,
      sync_writes: true,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IOManagerType {
  StandardFileIO,

  MemoryMap,
}
