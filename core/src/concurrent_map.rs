//! Sharded map for accumulating values from many worker threads.
//!
//! Keys are spread over a fixed number of shards by `key mod shard_count`; each
//! shard is an ordered map behind its own mutex, so writers touching different
//! shards never contend.

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

/// Integer keys that can pick their shard.
pub trait ShardKey: Ord + Copy {
    fn shard_index(&self, shard_count: usize) -> usize;
}

macro_rules! impl_shard_key {
    ($($t:ty),*) => {
        $(
            impl ShardKey for $t {
                #[inline]
                fn shard_index(&self, shard_count: usize) -> usize {
                    // Euclidean remainder keeps negative keys in range
                    (*self as i128).rem_euclid(shard_count as i128) as usize
                }
            }
        )*
    };
}

impl_shard_key!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Exclusive access to one value. The shard stays locked until this is dropped.
pub struct Access<'a, V> {
    value: MappedMutexGuard<'a, V>,
}

impl<V> Deref for Access<'_, V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.value
    }
}

impl<V> DerefMut for Access<'_, V> {
    fn deref_mut(&mut self) -> &mut V {
        &mut self.value
    }
}

pub struct ConcurrentMap<K, V> {
    shards: Vec<Mutex<BTreeMap<K, V>>>,
}

impl<K: ShardKey, V: Default> ConcurrentMap<K, V> {
    pub fn new(shard_count: usize) -> Self {
        let shards = (0..shard_count.max(1)).map(|_| Mutex::new(BTreeMap::new())).collect();
        Self { shards }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard(&self, key: &K) -> &Mutex<BTreeMap<K, V>> {
        &self.shards[key.shard_index(self.shards.len())]
    }

    /// Lock the key's shard and return its value, inserting `V::default()` first if absent.
    pub fn access(&self, key: K) -> Access<'_, V> {
        let guard = self.shard(&key).lock();
        Access { value: MutexGuard::map(guard, |map| map.entry(key).or_default()) }
    }

    pub fn erase(&self, key: K) -> Option<V> {
        self.shard(&key).lock().remove(&key)
    }

    /// Drain every shard into one ordered map.
    ///
    /// Shards are locked and drained one at a time. Writers still running while
    /// this executes may land in a shard that was already drained, so the result
    /// is only a consistent view once all writers have finished.
    pub fn build_ordinary_map(&self) -> BTreeMap<K, V> {
        let mut result = BTreeMap::new();
        for shard in &self.shards {
            result.append(&mut *shard.lock());
        }
        result
    }

    pub fn into_ordinary_map(self) -> BTreeMap<K, V> {
        let mut result = BTreeMap::new();
        for shard in self.shards {
            result.append(&mut shard.into_inner());
        }
        result
    }
}
