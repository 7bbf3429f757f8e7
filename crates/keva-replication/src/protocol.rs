//! Replication wire format.
//!
//! Same transport as client traffic, different (binary) protocol on a
//! distinct address. Both messages are self-contained: a length-prefixed
//! segment name plus, in the response, a status byte and the raw segment
//! bytes.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ReplicationError, ReplicationResult};

fn put_string(buf: &mut BytesMut, value: &str) {
    buf.put_u32(value.len() as u32);
    buf.put_slice(value.as_bytes());
}

fn get_string(buf: &mut impl Buf) -> ReplicationResult<String> {
    if buf.remaining() < 4 {
        return Err(ReplicationError::decode("truncated string length"));
    }
    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return Err(ReplicationError::decode(format!(
            "string length {len} exceeds {} remaining bytes",
            buf.remaining()
        )));
    }
    String::from_utf8(buf.copy_to_bytes(len).to_vec())
        .map_err(|_| ReplicationError::decode("string is not valid UTF-8"))
}

/// A standby's catch-up request: the last segment it has fully applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// The cursor; empty for a standby that has nothing yet.
    pub last_segment_name: String,
}

impl SyncRequest {
    /// Creates a request for the first segment after `last_segment_name`.
    #[must_use]
    pub fn new(last_segment_name: impl Into<String>) -> Self {
        Self {
            last_segment_name: last_segment_name.into(),
        }
    }

    /// Encodes the request.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(4 + self.last_segment_name.len());
        put_string(&mut buf, &self.last_segment_name);
        buf.freeze()
    }

    /// Decodes a request.
    pub fn decode(data: &[u8]) -> ReplicationResult<Self> {
        let mut buf = data;
        let last_segment_name = get_string(&mut buf)?;
        if buf.has_remaining() {
            return Err(ReplicationError::decode("trailing bytes after request"));
        }
        Ok(Self { last_segment_name })
    }
}

/// The master's answer to a [`SyncRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResponse {
    /// False when the master hit an error looking up or reading the segment.
    pub succeed: bool,
    /// Name of the shipped segment; empty means the standby is caught up.
    pub segment_name: String,
    /// Raw bytes of the shipped segment.
    pub segment_data: Bytes,
}

impl SyncResponse {
    /// A response shipping one segment.
    #[must_use]
    pub fn segment(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            succeed: true,
            segment_name: name.into(),
            segment_data: data.into(),
        }
    }

    /// The "nothing newer than your cursor" response.
    #[must_use]
    pub fn caught_up() -> Self {
        Self {
            succeed: true,
            segment_name: String::new(),
            segment_data: Bytes::new(),
        }
    }

    /// The "master could not serve this" response.
    #[must_use]
    pub fn failure() -> Self {
        Self {
            succeed: false,
            segment_name: String::new(),
            segment_data: Bytes::new(),
        }
    }

    /// Encodes the response.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(
            1 + 4 + self.segment_name.len() + 4 + self.segment_data.len(),
        );
        buf.put_u8(u8::from(self.succeed));
        put_string(&mut buf, &self.segment_name);
        buf.put_u32(self.segment_data.len() as u32);
        buf.put_slice(&self.segment_data);
        buf.freeze()
    }

    /// Decodes a response.
    pub fn decode(data: &[u8]) -> ReplicationResult<Self> {
        let mut buf = data;
        if buf.remaining() < 1 {
            return Err(ReplicationError::decode("empty response"));
        }
        let succeed = buf.get_u8() != 0;
        let segment_name = get_string(&mut buf)?;

        if buf.remaining() < 4 {
            return Err(ReplicationError::decode("truncated segment data length"));
        }
        let len = buf.get_u32() as usize;
        if buf.remaining() != len {
            return Err(ReplicationError::decode(format!(
                "segment data length {len} does not match {} remaining bytes",
                buf.remaining()
            )));
        }
        let segment_data = buf.copy_to_bytes(len);

        Ok(Self {
            succeed,
            segment_name,
            segment_data,
        })
    }
}
