use std::path::Path;

/// Total bytes used by the database directory.
pub fn dir_disk_size<P>(dir_path: P) -> u64
where
  P: AsRef<Path>,
{
  if let Ok(size) = fs_extra::dir::get_size(dir_path) {
    return size;
  }
  0
}
