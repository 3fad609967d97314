use std::collections::{HashMap, VecDeque};

use bytes::Bytes;
use thiserror::Error;
use tokio::time::{Duration, Instant};

use crate::{sorted_set::SortedSet, stream::Stream};

/// Operation against a key holding the wrong kind of value.
#[derive(Error, Debug, PartialEq, Clone, Copy)]
#[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
pub struct WrongTypeError;

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    String(Bytes),
    List(VecDeque<Bytes>),
    Stream(Stream),
    SortedSet(SortedSet),
}

impl DataType {
    /// Name reported by TYPE.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::String(_) => "string",
            DataType::List(_) => "list",
            DataType::Stream(_) => "stream",
            DataType::SortedSet(_) => "zset",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub data: DataType,
    pub expiration: Option<Instant>,
}

impl Value {
    pub fn new(data: DataType) -> Self {
        Self {
            data,
            expiration: None,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expiration.is_some_and(|expiration| expiration <= now)
    }
}

/// Key to value mapping with lazy expiry.
///
/// Expired entries are removed the first time they are looked at, either by a
/// point lookup or by [`KeyValueStore::keys`].
#[derive(Debug, Default)]
pub struct KeyValueStore {
    entries: HashMap<Bytes, Value>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: HashMap<Bytes, Value>) -> Self {
        let mut store = Self { entries };
        store.remove_expired();
        store
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_if_expired(&mut self, key: &[u8]) {
        let now = Instant::now();

        if self.entries.get(key).is_some_and(|value| value.is_expired(now)) {
            self.entries.remove(key);
        }
    }

    fn remove_expired(&mut self) {
        let now = Instant::now();
        self.entries.retain(|_, value| !value.is_expired(now));
    }

    pub fn get(&mut self, key: &[u8]) -> Option<&Value> {
        self.evict_if_expired(key);
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut Value> {
        self.evict_if_expired(key);
        self.entries.get_mut(key)
    }

    pub fn contains_key(&mut self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Stores `data` under `key`, replacing whatever was there and its expiry.
    /// A `ttl` past the end of the clock's range never expires.
    pub fn set(&mut self, key: Bytes, data: DataType, ttl: Option<Duration>) {
        let expiration = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        self.entries.insert(key, Value { data, expiration });
    }

    /// Replaces the data of a live key and keeps its expiry. Absent keys are
    /// left absent.
    pub fn update_in_place(&mut self, key: &[u8], data: DataType) {
        if let Some(value) = self.get_mut(key) {
            value.data = data;
        }
    }

    pub fn delete(&mut self, key: &[u8]) -> bool {
        self.evict_if_expired(key);
        self.entries.remove(key).is_some()
    }

    /// Live keys, after sweeping every expired entry out of the table.
    pub fn keys(&mut self) -> Vec<Bytes> {
        self.remove_expired();
        self.entries.keys().cloned().collect()
    }

    /// Live entries, used to produce snapshots.
    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, &Value)> {
        let now = Instant::now();
        self.entries.iter().filter(move |(_, value)| !value.is_expired(now))
    }

    /// Swaps the whole keyspace, as a follower does after a full resync.
    pub fn replace_all(&mut self, entries: HashMap<Bytes, Value>) {
        self.entries = entries;
        self.remove_expired();
    }

    pub fn get_string(&mut self, key: &[u8]) -> Result<Option<&Bytes>, WrongTypeError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::String(value),
                ..
            }) => Ok(Some(value)),
            Some(_) => Err(WrongTypeError),
        }
    }

    pub fn get_list(&mut self, key: &[u8]) -> Result<Option<&VecDeque<Bytes>>, WrongTypeError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::List(list),
                ..
            }) => Ok(Some(list)),
            Some(_) => Err(WrongTypeError),
        }
    }

    pub fn get_list_mut(
        &mut self,
        key: &[u8],
    ) -> Result<Option<&mut VecDeque<Bytes>>, WrongTypeError> {
        match self.get_mut(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::List(list),
                ..
            }) => Ok(Some(list)),
            Some(_) => Err(WrongTypeError),
        }
    }

    pub fn get_stream(&mut self, key: &[u8]) -> Result<Option<&Stream>, WrongTypeError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::Stream(stream),
                ..
            }) => Ok(Some(stream)),
            Some(_) => Err(WrongTypeError),
        }
    }

    pub fn get_sorted_set(&mut self, key: &[u8]) -> Result<Option<&SortedSet>, WrongTypeError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::SortedSet(set),
                ..
            }) => Ok(Some(set)),
            Some(_) => Err(WrongTypeError),
        }
    }

    /// The list under `key`, created empty when the key is absent.
    pub fn list_entry(&mut self, key: &Bytes) -> Result<&mut VecDeque<Bytes>, WrongTypeError> {
        self.evict_if_expired(key);

        let value = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Value::new(DataType::List(VecDeque::new())));

        match &mut value.data {
            DataType::List(list) => Ok(list),
            _ => Err(WrongTypeError),
        }
    }

    pub fn stream_entry(&mut self, key: &Bytes) -> Result<&mut Stream, WrongTypeError> {
        self.evict_if_expired(key);

        let value = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Value::new(DataType::Stream(Stream::new())));

        match &mut value.data {
            DataType::Stream(stream) => Ok(stream),
            _ => Err(WrongTypeError),
        }
    }

    pub fn sorted_set_entry(&mut self, key: &Bytes) -> Result<&mut SortedSet, WrongTypeError> {
        self.evict_if_expired(key);

        let value = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Value::new(DataType::SortedSet(SortedSet::new())));

        match &mut value.data {
            DataType::SortedSet(set) => Ok(set),
            _ => Err(WrongTypeError),
        }
    }

    /// Drops `key` when it holds an empty list, stream or sorted set. Used
    /// after a failed append left a freshly created container behind, and
    /// after pops empty a list.
    pub fn remove_if_empty(&mut self, key: &[u8]) {
        let empty = match self.entries.get(key).map(|value| &value.data) {
            Some(DataType::List(list)) => list.is_empty(),
            Some(DataType::Stream(stream)) => stream.is_empty(),
            Some(DataType::SortedSet(set)) => set.is_empty(),
            _ => false,
        };

        if empty {
            self.entries.remove(key);
        }
    }
}
