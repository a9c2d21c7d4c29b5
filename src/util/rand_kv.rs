use bytes::Bytes;

pub fn get_test_key(i: usize) -> Bytes {
  Bytes::from(format!("ember-kv-key-{:09}", i))
}

/// A value padded wide enough to make data files fill up quickly in tests.
pub fn get_test_value(i: usize) -> Bytes {
  Bytes::from(format!(
    "ember-kv-value-value-value-value-value-value-{:09}",
    i
  ))
}
