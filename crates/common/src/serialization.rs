//! Serialization utilities.
//!
//! This module provides custom serializers for values that should not be
//! written out verbatim, such as uploaded file contents in log records.

use serde::Serializer;

/// Serialize a byte payload as its length.
///
/// # Examples
///
/// ```
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Upload {
///     #[serde(rename = "file_size", serialize_with = "articles_common::serialization::serialize_bytes_len")]
///     data: Vec<u8>,
/// }
///
/// let json = serde_json::to_string(&Upload { data: vec![1, 2, 3] }).unwrap();
/// assert_eq!(json, r#"{"file_size":3}"#);
/// ```
pub fn serialize_bytes_len<B, S>(bytes: &B, serializer: S) -> Result<S::Ok, S::Error>
where
    B: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_u64(bytes.as_ref().len() as u64)
}
