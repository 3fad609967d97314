//! Append-only stream value type.

use std::{fmt, str::FromStr};

use bytes::Bytes;
use thiserror::Error;

use crate::resp::RespValue;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum StreamError {
    #[error("ERR Invalid stream ID specified as stream command argument")]
    InvalidId,
    #[error("ERR The ID specified in XADD must be greater than 0-0")]
    ZeroId,
    #[error("ERR The ID specified in XADD is equal or smaller than the target stream top item")]
    NotIncreasing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub const ZERO: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MAX: StreamId = StreamId {
        ms: u64::MAX,
        seq: u64::MAX,
    };

    pub fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }

    /// Parses a range bound. A bare millisecond value expands to its lowest
    /// (start) or highest (end) sequence number.
    fn parse_bound(input: &str, missing_sequence: u64) -> Result<Self, StreamError> {
        match input.split_once('-') {
            Some((ms, seq)) => Ok(Self {
                ms: ms.parse().map_err(|_| StreamError::InvalidId)?,
                seq: seq.parse().map_err(|_| StreamError::InvalidId)?,
            }),
            None => Ok(Self {
                ms: input.parse().map_err(|_| StreamError::InvalidId)?,
                seq: missing_sequence,
            }),
        }
    }

    /// `-` or an id; a bare millisecond value means `<ms>-0`.
    pub fn parse_range_start(input: &str) -> Result<Self, StreamError> {
        if input == "-" {
            return Ok(Self::ZERO);
        }

        Self::parse_bound(input, 0)
    }

    /// `+` or an id; a bare millisecond value means the last sequence of `<ms>`.
    pub fn parse_range_end(input: &str) -> Result<Self, StreamError> {
        if input == "+" {
            return Ok(Self::MAX);
        }

        Self::parse_bound(input, u64::MAX)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

impl FromStr for StreamId {
    type Err = StreamError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse_bound(input, 0)
    }
}

/// The id argument of XADD before it is resolved against the stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreamIdRequest {
    /// `*`
    Auto,
    /// `<ms>-*`
    AutoSequence(u64),
    /// `<ms>-<seq>`
    Explicit(StreamId),
}

impl FromStr for StreamIdRequest {
    type Err = StreamError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input == "*" {
            return Ok(StreamIdRequest::Auto);
        }

        match input.split_once('-') {
            Some((ms, "*")) => Ok(StreamIdRequest::AutoSequence(
                ms.parse().map_err(|_| StreamError::InvalidId)?,
            )),
            Some(_) => Ok(StreamIdRequest::Explicit(input.parse()?)),
            None => Err(StreamError::InvalidId),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub id: StreamId,
    pub fields: Vec<(Bytes, Bytes)>,
}

impl StreamEntry {
    /// `[id, [field, value, ...]]`
    pub fn to_resp(&self) -> RespValue {
        let fields = self
            .fields
            .iter()
            .flat_map(|(field, value)| [field.clone(), value.clone()]);

        RespValue::Array(vec![
            RespValue::bulk_string(self.id.to_string()),
            RespValue::array_of_bulk_strings(fields),
        ])
    }
}

/// Entries ordered by strictly increasing id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stream {
    entries: Vec<StreamEntry>,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_id(&self) -> Option<StreamId> {
        self.entries.last().map(|entry| entry.id)
    }

    /// Sequence number an `<ms>-*` request resolves to. `None` once the
    /// sequence space of `ms` is used up.
    pub fn next_sequence(&self, ms: u64) -> Option<u64> {
        match self.last_id() {
            Some(last) if last.ms == ms => last.seq.checked_add(1),
            _ if ms == 0 => Some(1),
            _ => Some(0),
        }
    }

    pub fn resolve_id(&self, request: StreamIdRequest, now_ms: u64) -> Result<StreamId, StreamError> {
        let id = match request {
            StreamIdRequest::Auto => {
                // A clock that went backwards keeps appending under the newest ms.
                let ms = self.last_id().map_or(now_ms, |last| last.ms.max(now_ms));
                let seq = self.next_sequence(ms).ok_or(StreamError::NotIncreasing)?;
                StreamId::new(ms, seq)
            }
            StreamIdRequest::AutoSequence(ms) => {
                let seq = self.next_sequence(ms).ok_or(StreamError::NotIncreasing)?;
                StreamId::new(ms, seq)
            }
            StreamIdRequest::Explicit(id) => id,
        };

        if id == StreamId::ZERO {
            return Err(StreamError::ZeroId);
        }

        if let Some(last) = self.last_id() {
            if id <= last {
                return Err(StreamError::NotIncreasing);
            }
        }

        Ok(id)
    }

    pub fn append(
        &mut self,
        request: StreamIdRequest,
        fields: Vec<(Bytes, Bytes)>,
        now_ms: u64,
    ) -> Result<StreamId, StreamError> {
        let id = self.resolve_id(request, now_ms)?;
        self.entries.push(StreamEntry { id, fields });

        Ok(id)
    }

    /// Entries with `start <= id <= end`.
    pub fn range(&self, start: StreamId, end: StreamId, count: Option<usize>) -> &[StreamEntry] {
        let from = self.entries.partition_point(|entry| entry.id < start);
        let to = self.entries.partition_point(|entry| entry.id <= end);

        if from >= to {
            return &[];
        }

        let to = count.map_or(to, |count| to.min(from.saturating_add(count)));
        &self.entries[from..to]
    }

    /// Entries with `id > after`.
    pub fn entries_after(&self, after: StreamId, count: Option<usize>) -> &[StreamEntry] {
        let from = self.entries.partition_point(|entry| entry.id <= after);
        let to = count.map_or(self.entries.len(), |count| {
            self.entries.len().min(from.saturating_add(count))
        });

        &self.entries[from..to]
    }
}
