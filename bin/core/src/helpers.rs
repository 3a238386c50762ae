use rand::Rng;

/// Opaque version token. Regenerated on every successful write.
pub fn new_etag() -> String {
  let bytes: [u8; 8] = rand::rng().random();
  hex::encode(bytes)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn etags_are_opaque_hex() {
    let etag = new_etag();
    assert_eq!(etag.len(), 16);
    assert!(etag.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(etag, new_etag());
  }
}
