use std::{fs::File, fs::OpenOptions, io::Write, path::Path, sync::Arc};

use log::error;
use parking_lot::RwLock;

use crate::errors::{Errors, Result};

use super::IOManager;

/// Standard file system I/O backed by positional reads and appending writes.
pub struct FileIO {
  fd: Arc<RwLock<File>>,
}

impl FileIO {
  pub fn new<P>(file_name: P) -> Result<Self>
  where
    P: AsRef<Path>,
  {
    match OpenOptions::new()
      .create(true)
      .read(true)
      .append(true)
      .open(file_name)
    {
      Ok(file) => Ok(FileIO {
        fd: Arc::new(RwLock::new(file)),
      }),
      Err(e) => {
        error!("failed to open data file: {}", e);
        Err(Errors::Io(e))
      }
    }
  }
}

impl IOManager for FileIO {
  fn read(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
    let read_guard = self.fd.read();
    #[cfg(target_family = "unix")]
    {
      use std::os::unix::fs::FileExt;
      match read_guard.read_at(buf, offset) {
        Ok(n) => Ok(n),
        Err(e) => {
          error!("failed to read from data file: {}", e);
          Err(Errors::Io(e))
        }
      }
    }
    #[cfg(target_family = "windows")]
    {
      use std::os::windows::fs::FileExt;
      match read_guard.seek_read(buf, offset) {
        Ok(n) => Ok(n),
        Err(e) => {
          error!("failed to read from data file: {}", e);
          Err(Errors::Io(e))
        }
      }
    }
  }

  fn write(&self, buf: &[u8]) -> Result<usize> {
    let mut write_guard = self.fd.write();
    // write_all so a short write never leaves a half-appended record behind
    match write_guard.write_all(buf) {
      Ok(()) => Ok(buf.len()),
      Err(e) => {
        error!("failed to write to data file: {}", e);
        Err(Errors::Io(e))
      }
    }
  }

  fn sync(&self) -> Result<()> {
    let read_guard = self.fd.read();
    if let Err(e) = read_guard.sync_all() {
      error!("failed to sync data file: {}", e);
      return Err(Errors::Io(e));
    }
    Ok(())
  }

  fn size(&self) -> u64 {
    let read_guard = self.fd.read();
    let metadata = read_guard.metadata().expect("failed to get file metadata");
    metadata.len()
  }
}
