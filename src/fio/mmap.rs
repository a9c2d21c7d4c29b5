use std::{fs::OpenOptions, io, path::Path};

use log::error;
use memmap2::Mmap;

use crate::errors::{Errors, Result};

use super::IOManager;

/// Read-only memory-mapped I/O, used to replay data files at startup. The
/// map is taken once at open; the engine swaps every handle back to standard
/// file IO before serving writes.
pub struct MMapIO {
  map: Mmap,
}

impl MMapIO {
  pub fn new<P>(file_name: P) -> Result<Self>
  where
    P: AsRef<Path>,
  {
    let file = OpenOptions::new()
      .create(true)
      .read(true)
      .append(true)
      .open(file_name)
      .map_err(|e| {
        error!("failed to open data file: {}", e);
        Errors::Io(e)
      })?;

    let map = unsafe { Mmap::map(&file) }.map_err(|e| {
      error!("failed to map data file: {}", e);
      Errors::Io(e)
    })?;

    Ok(MMapIO { map })
  }
}

impl IOManager for MMapIO {
  fn read(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
    let end = offset + buf.len() as u64;
    if end > self.map.len() as u64 {
      return Err(Errors::ReadDataFileEOF);
    }

    buf.copy_from_slice(&self.map[offset as usize..end as usize]);
    Ok(buf.len())
  }

  // the mapping is read-only; appends and syncs only ever go through the
  // standard file IO handle
  fn write(&self, _buf: &[u8]) -> Result<usize> {
    Err(Errors::Io(io::Error::from(io::ErrorKind::Unsupported)))
  }

  fn sync(&self) -> Result<()> {
    Err(Errors::Io(io::Error::from(io::ErrorKind::Unsupported)))
  }

  fn size(&self) -> u64 {
    self.map.len() as u64
  }
}
