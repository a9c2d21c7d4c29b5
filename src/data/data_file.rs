use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use bytes::BytesMut;
use parking_lot::RwLock;

use crate::{
  errors::{Errors, Result},
  fio::{new_io_manager, IOManager},
  option::IOManagerType,
};

use super::log_record::{
  decode_log_record_header, max_log_record_header_size, LogRecord, LogRecordType, ReadLogRecord,
};

pub const DATA_FILE_NAME_SUFFIX: &str = ".data";

/// One append-only segment of the log. Bytes `[0, write_off)` hold a
/// concatenation of encoded records; appends advance `write_off`, reads are
/// positional and never move it.
pub struct DataFile {
  file_id: u32,
  write_off: Arc<RwLock<u64>>,
  io_manager: Box<dyn IOManager>,
}

impl DataFile {
  /// Opens or creates `<dir_path>/<file_id>.data`. The write offset starts at
  /// the current file length.
  pub fn new<P>(dir_path: P, file_id: u32, io_type: IOManagerType) -> Result<DataFile>
  where
    P: AsRef<Path>,
  {
    let file_name = get_data_file_name(dir_path, file_id);
    let io_manager = new_io_manager(file_name, io_type)?;
    let write_off = io_manager.size();

    Ok(DataFile {
      file_id,
      write_off: Arc::new(RwLock::new(write_off)),
      io_manager,
    })
  }

  pub fn get_file_id(&self) -> u32 {
    self.file_id
  }

  pub fn get_write_off(&self) -> u64 {
    *self.write_off.read()
  }

  pub fn set_write_off(&self, offset: u64) {
    let mut write_off = self.write_off.write();
    *write_off = offset;
  }

  /// Appends an encoded record, advancing the write offset only when the
  /// whole buffer went out.
  pub fn write(&self, buf: &[u8]) -> Result<usize> {
    let n_bytes = self.io_manager.write(buf)?;
    let mut write_off = self.write_off.write();
    *write_off += n_bytes as u64;
    Ok(n_bytes)
  }

  /// Reads and decodes the record starting at `offset`, returning it together
  /// with its total encoded length.
  pub fn read_log_record(&self, offset: u64) -> Result<ReadLogRecord> {
    let file_size = self.io_manager.size();
    if offset >= file_size {
      return Err(Errors::ReadDataFileEOF);
    }

    // the header is variable-length, read up to its maximum
    let mut header_len = max_log_record_header_size() as u64;
    if offset + header_len > file_size {
      header_len = file_size - offset;
    }
    let mut header_buf = BytesMut::zeroed(header_len as usize);
    self.io_manager.read(&mut header_buf, offset)?;

    let (header, header_size) = decode_log_record_header(&header_buf)?;
    if header.key_size == 0 && header.value_size == 0 {
      return Err(Errors::ReadDataFileEOF);
    }

    // a record never spans files, so a body running past the end of this one
    // is a torn tail
    let body_size = header.key_size + header.value_size;
    if offset + (header_size + body_size) as u64 > file_size {
      return Err(Errors::InvalidLogRecordCrc);
    }

    let mut body_buf = BytesMut::zeroed(body_size);
    self
      .io_manager
      .read(&mut body_buf, offset + header_size as u64)?;

    // the stored crc covers the header after the crc field plus the body
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&header_buf[4..header_size]);
    hasher.update(&body_buf);
    if hasher.finalize() != header.crc {
      return Err(Errors::InvalidLogRecordCrc);
    }

    let value = body_buf.split_off(header.key_size);
    let record = LogRecord {
      key: body_buf.to_vec(),
      value: value.to_vec(),
      rec_type: LogRecordType::from_u8(header.rec_type),
    };

    Ok(ReadLogRecord {
      record,
      size: header_size + body_size,
    })
  }

  pub fn sync(&self) -> Result<()> {
    self.io_manager.sync()
  }

  /// Swaps the underlying I/O implementation, keeping the same file.
  pub fn set_io_manager<P>(&mut self, dir_path: P, io_type: IOManagerType) -> Result<()>
  where
    P: AsRef<Path>,
  {
    self.io_manager = new_io_manager(get_data_file_name(dir_path, self.file_id), io_type)?;
    Ok(())
  }
}

pub fn get_data_file_name<P>(dir_path: P, file_id: u32) -> PathBuf
where
  P: AsRef<Path>,
{
  let name = format!("{:09}{}", file_id, DATA_FILE_NAME_SUFFIX);
  dir_path.as_ref().join(name)
}
