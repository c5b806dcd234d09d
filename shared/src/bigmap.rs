use std::collections::{btree_map, BTreeMap};

pub trait BigMapKey: Clone + Copy + Eq + PartialEq {
    fn to_u64(&self) -> u64;
    fn from_u64(value: u64) -> Self;
}

/// Keyed store which hands out a fresh key for every inserted value.
/// Keys are never reused for the lifetime of the map, so a stale key can
/// never alias a newer value.
pub struct BigMap<K: BigMapKey, V> {
    inner: BTreeMap<u64, V>,
    next_key: u64,
    phantom: std::marker::PhantomData<K>,
}

impl<K: BigMapKey, V> Default for BigMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: BigMapKey, V> BigMap<K, V> {
    pub fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
            next_key: 0,
            phantom: std::marker::PhantomData,
        }
    }

    pub fn insert(&mut self, value: V) -> K {
        let key = K::from_u64(self.next_key);
        self.next_key = self.next_key.wrapping_add(1);
        self.inner.insert(key.to_u64(), value);
        key
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(&key.to_u64())
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.inner.get_mut(&key.to_u64())
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.inner.remove(&key.to_u64())
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains_key(&key.to_u64())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> Vec<K> {
        self.inner.keys().map(|key| K::from_u64(*key)).collect()
    }

    pub fn iter(&self) -> BigMapIter<'_, K, V> {
        BigMapIter {
            inner: self.inner.iter(),
            phantom: std::marker::PhantomData,
        }
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

pub struct BigMapIter<'a, K: BigMapKey, V> {
    inner: btree_map::Iter<'a, u64, V>,
    phantom: std::marker::PhantomData<K>,
}

impl<'a, K: BigMapKey, V> Iterator for BigMapIter<'a, K, V> {
    type Item = (K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(key, value)| (K::from_u64(*key), value))
    }
}
