use std::{
  collections::HashMap,
  fs,
  path::Path,
  sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
  },
};

use bytes::Bytes;
use log::error;
use parking_lot::RwLock;

use crate::{
  data::{
    data_file::{DataFile, DATA_FILE_NAME_SUFFIX},
    log_record::{LogRecord, LogRecordPos, LogRecordType},
  },
  errors::{Errors, Result},
  index,
  option::{IOManagerType, Options},
  util,
};

const INITIAL_FILE_ID: u32 = 0;

/// A Bitcask-style storage engine instance: one append-only log spread over
/// numbered data files, and an in-memory index from every live key to the
/// position of its newest record.
pub struct Engine {
  pub(crate) options: Arc<Options>,
  /// Current data file receiving appends. Absent until the first write.
  pub(crate) active_data_file: Arc<RwLock<Option<DataFile>>>,
  /// Rotated data files, read-only, keyed by file id.
  pub(crate) old_data_files: Arc<RwLock<HashMap<u32, DataFile>>>,
  pub(crate) index: Box<dyn index::Indexer>,
  /// File ids discovered at open, ascending. Only used while loading the
  /// index.
  file_ids: Vec<u32>,
  /// Bytes appended since the last sync, drives the bytes_per_sync threshold.
  bytes_written: Arc<AtomicUsize>,
  is_closed: Arc<AtomicBool>,
}

/// Counters describing the engine at a point in time.
#[derive(Debug)]
pub struct Stat {
  /// Number of live keys in the index.
  pub key_num: usize,
  /// Number of data files on disk, the active one included.
  pub data_file_num: usize,
  /// Total bytes used by the database directory.
  pub disk_size: u64,
}

impl Engine {
  /// Opens a storage engine instance on a directory, creating it when absent
  /// and replaying every data file to rebuild the index.
  pub fn open(options: Options) -> Result<Self> {
    check_options(&options)?;

    let dir_path = options.dir_path.clone();
    if !dir_path.is_dir() {
      if let Err(e) = fs::create_dir_all(&dir_path) {
        error!("failed to create database directory: {}", e);
        return Err(Errors::Io(e));
      }
    }

    let mut data_files = load_data_files(&dir_path, options.mmap_at_startup)?;
    let file_ids: Vec<u32> = data_files.iter().map(|f| f.get_file_id()).collect();

    // the largest id receives appends, every other file is read-only
    let active_file = data_files.pop();
    let old_files: HashMap<u32, DataFile> = data_files
      .into_iter()
      .map(|f| (f.get_file_id(), f))
      .collect();

    let engine = Self {
      index: index::new_indexer(&options.index_type),
      options: Arc::new(options),
      active_data_file: Arc::new(RwLock::new(active_file)),
      old_data_files: Arc::new(RwLock::new(old_files)),
      file_ids,
      bytes_written: Arc::new(AtomicUsize::new(0)),
      is_closed: Arc::new(AtomicBool::new(false)),
    };

    engine.load_index_from_data_files()?;

    if engine.options.mmap_at_startup {
      engine.reset_io_type()?;
    }

    Ok(engine)
  }

  /// Stores a key-value pair. The key must not be empty.
  pub fn put(&self, key: Bytes, value: Bytes) -> Result<()> {
    self.check_open()?;
    if key.is_empty() {
      return Err(Errors::KeyIsEmpty);
    }

    let record = LogRecord {
      key: key.to_vec(),
      value: value.to_vec(),
      rec_type: LogRecordType::Normal,
    };
    let pos = self.append_log_record(&record)?;

    if !self.index.put(key.to_vec(), pos) {
      return Err(Errors::IndexUpdateFailed);
    }
    Ok(())
  }

  /// Fetches the value stored under a key.
  pub fn get(&self, key: Bytes) -> Result<Bytes> {
    self.check_open()?;
    if key.is_empty() {
      return Err(Errors::KeyIsEmpty);
    }

    let pos = match self.index.get(key.to_vec()) {
      Some(pos) => pos,
      None => return Err(Errors::KeyNotFound),
    };

    self.get_value_by_position(&pos)
  }

  /// Removes a key. Deleting a key that is not there is a no-op.
  pub fn delete(&self, key: Bytes) -> Result<()> {
    self.check_open()?;
    if key.is_empty() {
      return Err(Errors::KeyIsEmpty);
    }

    if self.index.get(key.to_vec()).is_none() {
      return Ok(());
    }

    // a tombstone in the log shadows every earlier record for the key
    let record = LogRecord {
      key: key.to_vec(),
      value: Default::default(),
      rec_type: LogRecordType::Deleted,
    };
    self.append_log_record(&record)?;

    if !self.index.delete(key.to_vec()) {
      return Err(Errors::IndexUpdateFailed);
    }
    Ok(())
  }

  /// Flushes the active data file to durable storage.
  pub fn sync(&self) -> Result<()> {
    self.check_open()?;
    let active_file = self.active_data_file.read();
    match active_file.as_ref() {
      Some(file) => file.sync(),
      None => Ok(()),
    }
  }

  /// Syncs and releases every data file. Later operations fail with
  /// `EngineClosed`; closing twice is a no-op.
  pub fn close(&self) -> Result<()> {
    if self.is_closed.swap(true, Ordering::SeqCst) {
      return Ok(());
    }

    let mut active_file = self.active_data_file.write();
    if let Some(file) = active_file.as_ref() {
      file.sync()?;
    }
    *active_file = None;
    self.old_data_files.write().clear();
    Ok(())
  }

  /// Reports index size, data file count and disk usage.
  pub fn get_engine_stat(&self) -> Result<Stat> {
    self.check_open()?;

    let active_file = self.active_data_file.read();
    let old_files = self.old_data_files.read();
    let data_file_num = old_files.len() + active_file.as_ref().map_or(0, |_| 1);

    Ok(Stat {
      key_num: self.index.size(),
      data_file_num,
      disk_size: util::file::dir_disk_size(&self.options.dir_path),
    })
  }

  /// Reads the record a position points at and returns its value.
  pub(crate) fn get_value_by_position(&self, pos: &LogRecordPos) -> Result<Bytes> {
    let active_file = self.active_data_file.read();
    let old_files = self.old_data_files.read();

    let log_record = match active_file.as_ref() {
      Some(file) if file.get_file_id() == pos.file_id => file.read_log_record(pos.offset)?.record,
      _ => match old_files.get(&pos.file_id) {
        Some(file) => file.read_log_record(pos.offset)?.record,
        None => return Err(Errors::DataFileNotFound),
      },
    };

    // the index never points at tombstones, treat one as absence anyway
    if log_record.rec_type == LogRecordType::Deleted {
      return Err(Errors::KeyNotFound);
    }

    Ok(log_record.value.into())
  }

  /// Appends a record to the active data file, rotating first when the record
  /// would push it past `data_file_size`. Returns where the record landed.
  pub(crate) fn append_log_record(&self, record: &LogRecord) -> Result<LogRecordPos> {
    let dir_path = &self.options.dir_path;

    let enc_record = record.encode();
    let record_len = enc_record.len() as u64;

    let mut active_file = self.active_data_file.write();

    // first write ever, the log starts at file id 0
    if active_file.is_none() {
      let data_file = DataFile::new(dir_path, INITIAL_FILE_ID, IOManagerType::StandardFileIO)?;
      *active_file = Some(data_file);
    }

    // rotate when the record would overflow the active file: sync it and
    // open its successor before the handle moves, so a failure leaves the
    // current file in place
    let mut rotated: Option<DataFile> = None;
    if let Some(file) = active_file.as_ref() {
      if file.get_write_off() + record_len > self.options.data_file_size {
        file.sync()?;
        let new_file =
          DataFile::new(dir_path, file.get_file_id() + 1, IOManagerType::StandardFileIO)?;
        rotated = Some(new_file);
      }
    }
    if let Some(new_file) = rotated {
      if let Some(old_file) = active_file.take() {
        self.old_data_files.write().insert(old_file.get_file_id(), old_file);
      }
      *active_file = Some(new_file);
    }

    let active = match active_file.as_ref() {
      Some(file) => file,
      None => return Err(Errors::DataFileNotFound),
    };

    let write_off = active.get_write_off();
    active.write(&enc_record)?;

    let previous = self
      .bytes_written
      .fetch_add(enc_record.len(), Ordering::SeqCst);
    let need_sync = self.options.sync_writes
      || (self.options.bytes_per_sync > 0
        && previous + enc_record.len() >= self.options.bytes_per_sync);
    if need_sync {
      active.sync()?;
      self.bytes_written.store(0, Ordering::SeqCst);
    }

    Ok(LogRecordPos {
      file_id: active.get_file_id(),
      offset: write_off,
    })
  }

  /// Replays every data file in ascending id order and rebuilds the index:
  /// normal records become entries, tombstones remove them.
  fn load_index_from_data_files(&self) -> Result<()> {
    if self.file_ids.is_empty() {
      return Ok(());
    }

    let active_file = self.active_data_file.read();
    let old_files = self.old_data_files.read();

    for (i, file_id) in self.file_ids.iter().enumerate() {
      let data_file: &DataFile = match active_file.as_ref() {
        Some(file) if file.get_file_id() == *file_id => file,
        _ => match old_files.get(file_id) {
          Some(file) => file,
          None => return Err(Errors::DataFileNotFound),
        },
      };

      let mut offset = 0;
      loop {
        let (record, size) = match data_file.read_log_record(offset) {
          Ok(result) => (result.record, result.size),
          Err(e) => {
            if e == Errors::ReadDataFileEOF {
              break;
            }
            return Err(e);
          }
        };

        let pos = LogRecordPos {
          file_id: *file_id,
          offset,
        };
        match record.rec_type {
          LogRecordType::Normal => {
            if !self.index.put(record.key, pos) {
              return Err(Errors::IndexUpdateFailed);
            }
          }
          // tombstones may pile up for the same key, removing an absent
          // entry is fine
          LogRecordType::Deleted => {
            self.index.delete(record.key);
          }
        }

        offset += size as u64;
      }

      // the active file keeps receiving appends from where the replay ended
      if i == self.file_ids.len() - 1 {
        if let Some(file) = active_file.as_ref() {
          file.set_write_off(offset);
        }
      }
    }
    Ok(())
  }

  /// Swaps every data file back to standard file IO after an mmap replay.
  fn reset_io_type(&self) -> Result<()> {
    let mut active_file = self.active_data_file.write();
    if let Some(file) = active_file.as_mut() {
      file.set_io_manager(&self.options.dir_path, IOManagerType::StandardFileIO)?;
    }

    let mut old_files = self.old_data_files.write();
    for (_, file) in old_files.iter_mut() {
      file.set_io_manager(&self.options.dir_path, IOManagerType::StandardFileIO)?;
    }
    Ok(())
  }

  pub(crate) fn check_open(&self) -> Result<()> {
    if self.is_closed.load(Ordering::SeqCst) {
      return Err(Errors::EngineClosed);
    }
    Ok(())
  }
}

impl Drop for Engine {
  fn drop(&mut self) {
    if let Err(e) = self.close() {
      error!("error while closing the engine: {}", e);
    }
  }
}

fn check_options(options: &Options) -> Result<()> {
  let dir_path = options.dir_path.to_str();
  if dir_path.is_none() || dir_path.unwrap().is_empty() {
    return Err(Errors::InvalidOptions("the database directory path is empty"));
  }
  if options.data_file_size == 0 {
    return Err(Errors::InvalidOptions(
      "the data file size must be greater than 0",
    ));
  }
  Ok(())
}

/// Lists `.data` files in the directory and opens them in ascending id order.
fn load_data_files<P>(dir_path: P, use_mmap: bool) -> Result<Vec<DataFile>>
where
  P: AsRef<Path>,
{
  let dir = match fs::read_dir(&dir_path) {
    Ok(dir) => dir,
    Err(e) => {
      error!("failed to read database directory: {}", e);
      return Err(Errors::Io(e));
    }
  };

  let mut file_ids: Vec<u32> = Vec::new();
  for entry in dir.flatten() {
    let file_os_str = entry.file_name();
    let file_name = file_os_str.to_string_lossy();

    // anything other than a numbered data file is foreign matter
    if let Some(stem) = file_name.strip_suffix(DATA_FILE_NAME_SUFFIX) {
      let file_id = stem
        .parse::<u32>()
        .map_err(|_| Errors::DataDirectoryCorrupted)?;
      file_ids.push(file_id);
    }
  }
  file_ids.sort();

  let io_type = if use_mmap {
    IOManagerType::MemoryMap
  } else {
    IOManagerType::StandardFileIO
  };

  let mut data_files = Vec::with_capacity(file_ids.len());
  for file_id in file_ids.iter() {
    data_files.push(DataFile::new(&dir_path, *file_id, io_type)?);
  }
  Ok(data_files)
}
