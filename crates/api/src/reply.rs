//! Command replies, as captured by a pipeline

use std::collections::BTreeMap;

use redshim_primitives::TtlStatus;

/// Reply of one command
///
/// `Nil` doubles as the reference store's "false" for a missing key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Missing value
    Nil,
    /// Success with no payload
    Ok,
    /// Yes/no outcome (`setnx`, `set_timeout`)
    Bool(bool),
    /// Integer (counts, lengths, counters, TTLs)
    Int(i64),
    /// Byte string
    Bulk(Vec<u8>),
    /// Ordered replies (`lrange`, `hmget`)
    Array(Vec<Reply>),
    /// Field → value pairs (`hgetall`)
    Map(BTreeMap<Vec<u8>, Vec<u8>>),
}

impl Reply {
    /// Bulk reply from anything byte-like
    pub fn bulk(bytes: impl AsRef<[u8]>) -> Self {
        Reply::Bulk(bytes.as_ref().to_vec())
    }

    /// Whether this is `Nil`
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    /// Bytes of a `Bulk` reply
    pub fn as_bulk(&self) -> Option<&[u8]> {
        match self {
            Reply::Bulk(b) => Some(b),
            _ => None,
        }
    }

    /// Integer of an `Int` reply
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Reply::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::Ok
    }
}

impl From<bool> for Reply {
    fn from(b: bool) -> Self {
        Reply::Bool(b)
    }
}

impl From<i64> for Reply {
    fn from(i: i64) -> Self {
        Reply::Int(i)
    }
}

impl From<usize> for Reply {
    fn from(n: usize) -> Self {
        Reply::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<Option<Vec<u8>>> for Reply {
    fn from(value: Option<Vec<u8>>) -> Self {
        value.map_or(Reply::Nil, Reply::Bulk)
    }
}

impl From<Vec<Vec<u8>>> for Reply {
    fn from(items: Vec<Vec<u8>>) -> Self {
        Reply::Array(items.into_iter().map(Reply::Bulk).collect())
    }
}

impl From<Vec<Option<Vec<u8>>>> for Reply {
    fn from(items: Vec<Option<Vec<u8>>>) -> Self {
        Reply::Array(items.into_iter().map(Reply::from).collect())
    }
}

impl From<BTreeMap<Vec<u8>, Vec<u8>>> for Reply {
    fn from(map: BTreeMap<Vec<u8>, Vec<u8>>) -> Self {
        Reply::Map(map)
    }
}

impl From<TtlStatus> for Reply {
    fn from(status: TtlStatus) -> Self {
        Reply::Int(status.as_reply())
    }
}
