//! Log record and its binary codec.
//!
//! Records are self-delimiting so a segment's body can be a plain
//! concatenation of encoded records: decoding loops while bytes remain.
//!
//! Layout:
//! - lsn: 8 bytes (big-endian)
//! - command: 1 byte tag
//! - argument count: 2 bytes
//! - per argument: 4-byte length prefix followed by UTF-8 bytes

use bytes::{Buf, BufMut, BytesMut};

use keva_common::types::{CommandKind, Lsn};

use crate::error::{WalError, WalResult};

/// A single durable operation.
///
/// Immutable once created; the LSN defines its position in the global replay
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Log sequence number assigned when the operation entered the store.
    pub lsn: Lsn,
    /// The operation.
    pub command: CommandKind,
    /// Operation arguments: `[key, value]` for `Set`, `[key]` for `Del`.
    pub args: Vec<String>,
}

impl LogRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(lsn: Lsn, command: CommandKind, args: Vec<String>) -> Self {
        Self { lsn, command, args }
    }

    /// Creates a `Set` record.
    #[must_use]
    pub fn set(lsn: Lsn, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(lsn, CommandKind::Set, vec![key.into(), value.into()])
    }

    /// Creates a `Del` record.
    #[must_use]
    pub fn del(lsn: Lsn, key: impl Into<String>) -> Self {
        Self::new(lsn, CommandKind::Del, vec![key.into()])
    }

    /// Appends the encoded record to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u64(self.lsn.as_u64());
        buf.put_u8(self.command.as_u8());
        buf.put_u16(self.args.len() as u16);
        for arg in &self.args {
            buf.put_u32(arg.len() as u32);
            buf.put_slice(arg.as_bytes());
        }
    }

    /// Returns the encoded size of this record in bytes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        8 + 1 + 2 + self.args.iter().map(|a| 4 + a.len()).sum::<usize>()
    }

    /// Decodes one record from the front of `buf`, advancing it.
    pub fn decode(buf: &mut impl Buf) -> WalResult<Self> {
        if buf.remaining() < 11 {
            return Err(WalError::decode(format!(
                "truncated record header: {} bytes remaining",
                buf.remaining()
            )));
        }

        let lsn = Lsn::new(buf.get_u64());
        let tag = buf.get_u8();
        let command = CommandKind::from_u8(tag)
            .ok_or_else(|| WalError::decode(format!("unknown command tag {tag}")))?;
        let arg_count = buf.get_u16() as usize;

        let mut args = Vec::with_capacity(arg_count);
        for _ in 0..arg_count {
            if buf.remaining() < 4 {
                return Err(WalError::decode("truncated argument length"));
            }
            let len = buf.get_u32() as usize;
            if buf.remaining() < len {
                return Err(WalError::decode(format!(
                    "argument length {len} exceeds {} remaining bytes",
                    buf.remaining()
                )));
            }
            let bytes = buf.copy_to_bytes(len);
            let arg = String::from_utf8(bytes.to_vec())
                .map_err(|_| WalError::decode("argument is not valid UTF-8"))?;
            args.push(arg);
        }

        Ok(Self { lsn, command, args })
    }

    /// Decodes every record from a segment's raw bytes.
    pub fn decode_all(data: &[u8]) -> WalResult<Vec<Self>> {
        let mut buf = data;
        let mut records = Vec::new();
        while buf.has_remaining() {
            records.push(Self::decode(&mut buf)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let record = LogRecord::set(Lsn::new(42), "key", "value");

        let mut buf = BytesMut::new();
        record.encode(&mut buf);
        assert_eq!(buf.len(), record.encoded_len());

        let decoded = LogRecord::decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_concatenated_records() {
        let records = vec![
            LogRecord::set(Lsn::new(1), "a", "1"),
            LogRecord::del(Lsn::new(2), "a"),
            LogRecord::set(Lsn::new(3), "b", "2"),
        ];

        let mut buf = BytesMut::new();
        for record in &records {
            record.encode(&mut buf);
        }

        let decoded = LogRecord::decode_all(&buf).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn test_empty_value() {
        let record = LogRecord::set(Lsn::new(7), "key", "");
        let mut buf = BytesMut::new();
        record.encode(&mut buf);
        assert_eq!(LogRecord::decode_all(&buf).unwrap(), vec![record]);
    }

    #[test]
    fn test_truncated_input() {
        let record = LogRecord::set(Lsn::new(1), "key", "value");
        let mut buf = BytesMut::new();
        record.encode(&mut buf);

        for cut in [1, 5, 10, buf.len() - 1] {
            let err = LogRecord::decode_all(&buf[..cut]);
            assert!(err.is_err(), "decode of {cut}-byte prefix should fail");
        }
    }

    #[test]
    fn test_unknown_tag() {
        let mut buf = BytesMut::new();
        buf.put_u64(1);
        buf.put_u8(99);
        buf.put_u16(0);
        assert!(matches!(
            LogRecord::decode_all(&buf),
            Err(WalError::Decode { .. })
        ));
    }
}
