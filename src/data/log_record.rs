use bytes::{Buf, BufMut, BytesMut};
use prost::{decode_length_delimiter, encode_length_delimiter, length_delimiter_len};

use crate::errors::{Errors, Result};

/// A single update in the log. Records are immutable once written.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
  pub(crate) key: Vec<u8>,
  pub(crate) value: Vec<u8>,
  pub(crate) rec_type: LogRecordType,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogRecordType {
  Normal = 0,

  /// Tombstone, carries an empty value and marks the key deleted.
  Deleted = 1,
}

impl LogRecordType {
  pub fn from_u8(v: u8) -> Self {
    match v {
      0 => LogRecordType::Normal,
      1 => LogRecordType::Deleted,
      _ => panic!("unknown log record type {v}"),
    }
  }
}

/// In-memory position of a record: which data file it lives in and the byte
/// offset it starts at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRecordPos {
  pub(crate) file_id: u32,
  pub(crate) offset: u64,
}

/// A record decoded from disk together with the byte length it occupied,
/// header included.
pub struct ReadLogRecord {
  pub(crate) record: LogRecord,
  pub(crate) size: usize,
}

/// Parsed record header. The two sizes are varint encoded on disk, so the
/// header length varies per record.
pub(crate) struct LogRecordHeader {
  pub(crate) crc: u32,
  pub(crate) rec_type: u8,
  pub(crate) key_size: usize,
  pub(crate) value_size: usize,
}

impl LogRecord {
  /// Serializes the record for appending to a data file.
  ///
  /// Layout: `crc (4, LE) | type (1) | key size varint | value size varint |
  /// key | value`. The crc covers every byte after itself, so a reader can
  /// consume the header, then exactly `key_size + value_size` payload bytes,
  /// and verify in one pass.
  pub fn encode(&self) -> Vec<u8> {
    let (enc_buf, _) = self.encode_and_get_crc();
    enc_buf
  }

  pub fn get_crc(&self) -> u32 {
    let (_, crc) = self.encode_and_get_crc();
    crc
  }

  fn encode_and_get_crc(&self) -> (Vec<u8>, u32) {
    let mut buf = BytesMut::with_capacity(self.encoded_length());

    // crc placeholder, filled in once the rest is laid out
    buf.put_u32_le(0);
    buf.put_u8(self.rec_type as u8);
    encode_length_delimiter(self.key.len(), &mut buf).unwrap();
    encode_length_delimiter(self.value.len(), &mut buf).unwrap();
    buf.extend_from_slice(&self.key);
    buf.extend_from_slice(&self.value);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&buf[4..]);
    let crc = hasher.finalize();
    buf[..4].copy_from_slice(&crc.to_le_bytes());

    (buf.to_vec(), crc)
  }

  fn encoded_length(&self) -> usize {
    std::mem::size_of::<u32>()
      + std::mem::size_of::<u8>()
      + length_delimiter_len(self.key.len())
      + length_delimiter_len(self.value.len())
      + self.key.len()
      + self.value.len()
  }
}

/// Parses the header prefix of an encoded record. Returns the header and its
/// encoded length. The caller decides how many payload bytes follow and
/// verifies the crc against them.
pub(crate) fn decode_log_record_header(mut buf: &[u8]) -> Result<(LogRecordHeader, usize)> {
  let full_len = buf.len();
  if full_len < std::mem::size_of::<u32>() + std::mem::size_of::<u8>() {
    return Err(Errors::InvalidLogRecordCrc);
  }

  let crc = buf.get_u32_le();
  let rec_type = buf.get_u8();
  let key_size =
    decode_length_delimiter(&mut buf).map_err(|_| Errors::InvalidLogRecordCrc)?;
  let value_size =
    decode_length_delimiter(&mut buf).map_err(|_| Errors::InvalidLogRecordCrc)?;

  let header_size = full_len - buf.remaining();
  let header = LogRecordHeader {
    crc,
    rec_type,
    key_size,
    value_size,
  };
  Ok((header, header_size))
}

/// Upper bound of the encoded header: crc, type and two maximum-width size
/// varints.
pub(crate) fn max_log_record_header_size() -> usize {
  std::mem::size_of::<u32>()
    + std::mem::size_of::<u8>()
    + length_delimiter_len(u32::MAX as usize) * 2
}
