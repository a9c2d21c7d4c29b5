use std::result;

use thiserror::Error;

/// All failures an engine operation can surface. No component swallows a
/// failure; every variant reaches the caller.
#[derive(Error, Debug)]
pub enum Errors {
  #[error("the key is empty")]
  KeyIsEmpty,

  #[error("key is not found in database")]
  KeyNotFound,

  #[error("data file is not found in database")]
  DataFileNotFound,

  #[error("failed to update index")]
  IndexUpdateFailed,

  #[error("read data file EOF")]
  ReadDataFileEOF,

  #[error("invalid crc value, log record maybe corrupted")]
  InvalidLogRecordCrc,

  #[error("the database directory maybe corrupted")]
  DataDirectoryCorrupted,

  #[error("invalid options: {0}")]
  InvalidOptions(&'static str),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("the engine is closed")]
  EngineClosed,
}

// Tests compare errors by value; the io cause compares by kind.
impl PartialEq for Errors {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Errors::Io(a), Errors::Io(b)) => a.kind() == b.kind(),
      _ => std::mem::discriminant(self) == std::mem::discriminant(other),
    }
  }
}

pub type Result<T> = result::Result<T, Errors>;
