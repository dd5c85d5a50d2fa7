use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;

/// Folds the upper bits of `hash` into the low bits that select a bucket.
///
/// Bucket indices only look at the low bits, so keys whose hashes differ only
/// above bit 16 would otherwise all land in the same bucket.
///
/// # Examples
///
/// ```rust
/// # use chain_hash::hash_map::spread;
/// # use chain_hash::hash_table::index_for;
/// #
/// assert_eq!(index_for(0x1_0000, 16), index_for(0x2_0000, 16));
/// assert_ne!(index_for(spread(0x1_0000), 16), index_for(spread(0x2_0000), 16));
/// ```
#[inline(always)]
pub fn spread(hash: u64) -> u64 {
    hash ^ (hash >> 16)
}

/// Hashes a possibly absent key. The absent key always hashes to 0.
#[inline]
fn make_hash<K, S>(hash_builder: &S, key: Option<&K>) -> u64
where
    K: Hash,
    S: BuildHasher,
{
    match key {
        Some(key) => spread(hash_builder.hash_one(key)),
        None => 0,
    }
}

/// A hash map implemented using the chained HashTable as the underlying
/// storage.
///
/// `HashMap<K, V, S>` stores key-value pairs where keys implement `Hash + Eq`
/// and uses a configurable hasher builder `S` to hash keys. Keys are optional:
/// every method taking a key accepts either a key or `None`, and `None` is
/// stored, found and removed like any other key.
///
/// # Key contract
///
/// Equal keys must produce equal hashes. The map relies on this but cannot
/// check it. A `Hash` implementation that disagrees with `Eq` makes
/// lookups silently miss entries, or lets two entries exist for what `Eq`
/// considers the same key.
///
/// Each key's hash is computed once, when it is inserted, and reused whenever
/// the table grows.
///
/// # Performance Characteristics
///
/// - **Memory**: one pointer per bucket, plus one heap node per entry holding
///   `(Option<K>, V)`, a u64 for the hash and the link to the next node.
#[derive(Clone)]
pub struct HashMap<K, V, S> {
    table: HashTable<(Option<K>, V)>,
    hash_builder: S,
}

impl<K, V, S> Debug for HashMap<K, V, S>
where
    K: Debug + Hash + Eq,
    V: Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            map.entry(&k, v);
        }
        map.finish()
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates a new hash map with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, _> = HashMap::with_hasher(SimpleHasher);
    /// assert!(map.is_empty());
    /// assert_eq!(map.bucket_count(), 16);
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(0, hash_builder)
    }

    /// Creates a new hash map with the specified capacity and hasher builder.
    ///
    /// The bucket array is rounded up to a power of two, so the actual
    /// capacity may be larger than requested.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, _> = HashMap::with_capacity_and_hasher(100, SimpleHasher);
    /// assert!(map.capacity() >= 100);
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            hash_builder,
        }
    }

    /// Returns the number of elements in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// assert_eq!(map.len(), 0);
    /// map.insert(1, "a");
    /// map.insert(None, "b");
    /// assert_eq!(map.len(), 2);
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of elements the map can hold before its bucket
    /// array doubles.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the length of the bucket array. Always a power of two.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Removes all elements from the map.
    ///
    /// This operation preserves the map's bucket array.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Reserves capacity for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map did not have this key present, `None` is returned.
    /// If the map did have this key present, the value is updated in place,
    /// and the old value is returned. The stored key is left untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Some(&"b"));
    ///
    /// assert_eq!(map.insert(None, "c"), None);
    /// assert_eq!(map.get(None), Some(&"c"));
    /// ```
    pub fn insert(&mut self, key: impl Into<Option<K>>, value: V) -> Option<V> {
        let key = key.into();
        let hash = make_hash(&self.hash_builder, key.as_ref());
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(mut entry) => {
                let old_value = core::mem::replace(&mut entry.get_mut().1, value);
                Some(old_value)
            }
            TableEntry::Vacant(entry) => {
                entry.insert((key, value));
                None
            }
        }
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// assert_eq!(map.get(None), None);
    /// ```
    pub fn get<'k>(&self, key: impl Into<Option<&'k K>>) -> Option<&V>
    where
        K: 'k,
    {
        let key = key.into();
        let hash = make_hash(&self.hash_builder, key);
        self.table
            .find(hash, |(k, _)| k.as_ref() == key)
            .map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut<'k>(&mut self, key: impl Into<Option<&'k K>>) -> Option<&mut V>
    where
        K: 'k,
    {
        let key = key.into();
        let hash = make_hash(&self.hash_builder, key);
        self.table
            .find_mut(hash, |(k, _)| k.as_ref() == key)
            .map(|(_, v)| v)
    }

    /// Returns `true` if the map contains the specified key.
    ///
    /// Presence depends only on the key, so a key stored with a value that is
    /// itself "empty" (for example `None` in a map of `Option`s) is still
    /// reported as present. The check is a single chain traversal.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map: HashMap<i32, Option<&str>, _> = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, None);
    /// assert!(map.contains_key(&1));
    /// assert!(!map.contains_key(&2));
    /// ```
    pub fn contains_key<'k>(&self, key: impl Into<Option<&'k K>>) -> bool
    where
        K: 'k,
    {
        let key = key.into();
        let hash = make_hash(&self.hash_builder, key);
        self.table
            .find(hash, |(k, _)| k.as_ref() == key)
            .is_some()
    }

    /// Removes a key from the map, returning the value at the key if the key
    /// was previously in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove<'k>(&mut self, key: impl Into<Option<&'k K>>) -> Option<V>
    where
        K: 'k,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes a key from the map, returning the stored key and value if the
    /// key was previously in the map.
    pub fn remove_entry<'k>(&mut self, key: impl Into<Option<&'k K>>) -> Option<(Option<K>, V)>
    where
        K: 'k,
    {
        let key = key.into();
        let hash = make_hash(&self.hash_builder, key);
        self.table.remove(hash, |(k, _)| k.as_ref() == key)
    }

    /// Gets the given key's corresponding entry in the map for in-place
    /// manipulation.
    pub fn entry(&mut self, key: impl Into<Option<K>>) -> Entry<'_, K, V> {
        let key = key.into();
        let hash = make_hash(&self.hash_builder, key.as_ref());
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry { entry }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry { entry, key }),
        }
    }

    /// Returns an iterator over the key-value pairs of the map.
    ///
    /// Keys are yielded as `Option<&K>`, `None` being the absent key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the keys of the map.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the map.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Removes all key-value pairs from the map, returning them through an
    /// iterator. The bucket array is kept.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Returns chain-length and memory statistics for the underlying table.
    ///
    /// Available in tests and with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> crate::hash_table::DebugStats {
        self.table.debug_stats()
    }

    /// Computes a histogram of chain lengths for the underlying table. See
    /// [`HashTable::chain_histogram`].
    ///
    /// Available in tests and with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_histogram(&self) -> alloc::vec::Vec<usize> {
        self.table.chain_histogram()
    }

    /// Prints the chain-length histogram of the underlying table to stdout.
    #[cfg(all(any(test, feature = "stats"), feature = "std"))]
    pub fn print_chain_histogram(&self) {
        self.table.print_chain_histogram();
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates a new hash map using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::DefaultHashBuilder;
    /// use chain_hash::HashMap;
    ///
    /// let map: HashMap<i32, String, DefaultHashBuilder> = HashMap::new();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 12);
    /// # }
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a new hash map with the specified capacity using the default
    /// hasher builder.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, S::default())
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

/// A view into a single entry in the map, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashMap`].
///
/// [`entry`]: HashMap::entry
pub enum Entry<'a, K, V> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V>),
}

impl<'a, K, V> Entry<'a, K, V> {
    /// Inserts a default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> Option<&K> {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V> Entry<'a, K, V>
where
    V: Default,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the map.
pub struct VacantEntry<'a, K, V> {
    entry: crate::hash_table::VacantEntry<'a, (Option<K>, V)>,
    key: Option<K>,
}

impl<'a, K, V> VacantEntry<'a, K, V> {
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> Option<K> {
        self.key
    }

    /// Inserts the value into the map and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        &mut self.entry.insert((self.key, value)).1
    }
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, K, V> {
    entry: crate::hash_table::OccupiedEntry<'a, (Option<K>, V)>,
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> Option<&K> {
        self.entry.get().0.as_ref()
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.entry.get().1
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.entry.get_mut().1
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.entry.into_mut().1
    }

    /// Inserts a value into the entry and returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(&mut self.entry.get_mut().1, value)
    }

    /// Removes the entry from the map and returns the value.
    pub fn remove(self) -> V {
        self.entry.remove().1
    }

    /// Removes the entry from the map and returns the key and value.
    pub fn remove_entry(self) -> (Option<K>, V) {
        self.entry.remove()
    }
}

/// An iterator over the key-value pairs of a `HashMap`.
pub struct Iter<'a, K, V> {
    inner: crate::hash_table::Iter<'a, (Option<K>, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Option<&'a K>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_ref(), v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// An iterator over the keys of a `HashMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = Option<&'a K>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// An iterator over the values of a `HashMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// A draining iterator over the key-value pairs of a `HashMap`.
pub struct Drain<'a, K, V> {
    inner: crate::hash_table::Drain<'a, (Option<K>, V)>,
}

impl<'a, K, V> Iterator for Drain<'a, K, V> {
    type Item = (Option<K>, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::Cell;
    use core::hash::BuildHasher;
    use core::hash::BuildHasherDefault;
    use core::hash::Hasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::hash_table::index_for;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k1: rng.try_next_u64().unwrap_or(0),
                k2: rng.try_next_u64().unwrap_or(0),
            }
        }
    }

    /// Hashes a `u64` key to itself, so tests can pick bucket placement.
    #[derive(Default)]
    struct IdentityHasher(u64);

    impl Hasher for IdentityHasher {
        fn finish(&self) -> u64 {
            self.0
        }

        fn write(&mut self, bytes: &[u8]) {
            for &byte in bytes {
                self.0 = self.0.rotate_left(8) ^ byte as u64;
            }
        }

        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }
    }

    type IdentityState = BuildHasherDefault<IdentityHasher>;

    fn bucket_of(map: &HashMap<u64, &str, IdentityState>, key: Option<&u64>) -> usize {
        index_for(make_hash(&map.hash_builder, key), map.bucket_count())
    }

    /// Distinct keys that always produce the same hash.
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Colliding(u32);

    impl Hash for Colliding {
        fn hash<H: Hasher>(&self, state: &mut H) {
            0xC0FFEEu32.hash(state);
        }
    }

    /// Key that counts how many times it is hashed.
    #[derive(Debug, Clone)]
    struct Counted {
        id: u64,
        hashes: Rc<Cell<usize>>,
    }

    impl PartialEq for Counted {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }

    impl Eq for Counted {}

    impl Hash for Counted {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.hashes.set(self.hashes.get() + 1);
            self.id.hash(state);
        }
    }

    #[test]
    fn test_new_and_with_hasher() {
        let map: HashMap<i32, String, SipHashBuilder> = HashMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.bucket_count(), 16);
        assert_eq!(map.capacity(), 12);

        let map2 = HashMap::<i32, String, _>::with_hasher(SipHashBuilder::default());
        assert!(map2.is_empty());
        assert_eq!(map2.len(), 0);
    }

    #[test]
    fn test_with_capacity() {
        let map: HashMap<i32, String, SipHashBuilder> = HashMap::with_capacity(100);
        assert!(map.capacity() >= 100);
        assert!(map.bucket_count().is_power_of_two());
        assert!(map.is_empty());

        let map2 =
            HashMap::<i32, String, _>::with_capacity_and_hasher(200, SipHashBuilder::default());
        assert!(map2.capacity() >= 200);
        assert!(map2.is_empty());
    }

    #[test]
    fn test_insert_and_get() {
        let mut map: HashMap<i32, String, _> = HashMap::with_hasher(SipHashBuilder::default());

        assert_eq!(map.insert(1, "hello".to_string()), None);
        assert_eq!(map.len(), 1);
        assert!(!map.is_empty());

        assert_eq!(map.get(&1), Some(&"hello".to_string()));
        assert_eq!(map.get(&2), None);

        assert_eq!(
            map.insert(1, "world".to_string()),
            Some("hello".to_string())
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"world".to_string()));
    }

    #[test]
    fn test_update_keeps_original_key() {
        let mut map: HashMap<Counted, &str, _> = HashMap::with_hasher(SipHashBuilder::default());
        let first = Counted {
            id: 1,
            hashes: Rc::new(Cell::new(0)),
        };
        let second = Counted {
            id: 1,
            hashes: Rc::new(Cell::new(0)),
        };

        map.insert(first.clone(), "a");
        assert_eq!(map.insert(second.clone(), "b"), Some("a"));

        let stored = map.keys().next().flatten().unwrap();
        assert!(Rc::ptr_eq(&stored.hashes, &first.hashes));
        assert_eq!(map.get(&first), Some(&"b"));
    }

    #[test]
    fn test_get_mut() {
        let mut map: HashMap<i32, String, _> = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string());

        if let Some(value) = map.get_mut(&1) {
            value.push_str(" world");
        }

        assert_eq!(map.get(&1), Some(&"hello world".to_string()));
        assert_eq!(map.get_mut(&2), None);
    }

    #[test]
    fn test_contains_key() {
        let mut map: HashMap<i32, String, _> = HashMap::with_hasher(SipHashBuilder::default());
        assert!(!map.contains_key(&1));

        map.insert(1, "value".to_string());
        assert!(map.contains_key(&1));
        assert!(!map.contains_key(&2));
    }

    #[test]
    fn test_contains_key_with_absent_value() {
        let mut map: HashMap<i32, Option<&str>, _> =
            HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, None);
        map.insert(2, Some("two"));

        assert!(map.contains_key(&1));
        assert_eq!(map.get(&1), Some(&None));
        assert!(map.contains_key(&2));
        assert!(!map.contains_key(&3));
        assert_eq!(map.get(&3), None);
    }

    #[test]
    fn test_remove() {
        let mut map: HashMap<i32, String, _> = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string());
        map.insert(2, "world".to_string());

        assert_eq!(map.remove(&1), Some("hello".to_string()));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), None);
        assert!(!map.contains_key(&1));
        assert!(map.contains_key(&2));

        assert_eq!(map.remove(&1), None);
        assert_eq!(map.remove(&3), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_remove_entry() {
        let mut map: HashMap<i32, String, _> = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string());

        assert_eq!(map.remove_entry(&1), Some((Some(1), "hello".to_string())));
        assert_eq!(map.len(), 0);
        assert_eq!(map.remove_entry(&1), None);
    }

    #[test]
    fn test_size_tracks_distinct_keys() {
        let mut map: HashMap<u64, u64, _> = HashMap::with_hasher(SipHashBuilder::default());
        for n in 0..50u64 {
            map.insert(n, n);
            assert_eq!(map.len(), n as usize + 1);
        }

        for n in 0..50u64 {
            map.insert(n, n + 1);
        }
        assert_eq!(map.len(), 50);

        for n in (0..50u64).rev() {
            assert_eq!(map.remove(&n), Some(n + 1));
            assert_eq!(map.len(), n as usize);
            assert_eq!(map.remove(&n), None);
            assert_eq!(map.len(), n as usize);
        }
        assert!(map.is_empty());
    }

    #[test]
    fn test_empty_map_lookups_are_noops() {
        let mut map: HashMap<u64, String, _> = HashMap::with_hasher(SipHashBuilder::default());
        assert_eq!(map.get(&7), None);
        assert_eq!(map.remove(&7), None);
        assert_eq!(map.get(None), None);
        assert_eq!(map.remove(None), None);
        assert!(!map.contains_key(None));
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
    }

    #[test]
    fn test_thirteenth_insert_resizes() {
        let mut map: HashMap<u64, u64, _> = HashMap::with_hasher(SipHashBuilder::default());
        for n in 0..12u64 {
            map.insert(n, n * 10);
        }
        assert_eq!(map.bucket_count(), 16);
        assert_eq!(map.capacity(), 12);

        map.insert(12, 120);
        assert_eq!(map.bucket_count(), 32);
        assert_eq!(map.capacity(), 24);
        assert_eq!(map.len(), 13);
        for n in 0..13u64 {
            assert_eq!(map.get(&n), Some(&(n * 10)));
        }
    }

    #[test]
    fn test_resize_reuses_cached_hashes() {
        let hashes = Rc::new(Cell::new(0));
        let key = |id| Counted {
            id,
            hashes: hashes.clone(),
        };

        let mut map: HashMap<Counted, u64, _> = HashMap::with_hasher(SipHashBuilder::default());
        for id in 0..13u64 {
            map.insert(key(id), id);
        }

        assert_eq!(map.bucket_count(), 32);
        assert_eq!(hashes.get(), 13);

        for id in 0..13u64 {
            assert_eq!(map.get(&key(id)), Some(&id));
        }
        assert_eq!(hashes.get(), 26);
    }

    #[test]
    fn test_keys_sharing_a_bucket() {
        let mut map: HashMap<u64, &str, IdentityState> = HashMap::default();
        assert_eq!(bucket_of(&map, Some(&1)), bucket_of(&map, Some(&17)));

        map.insert(1, "one");
        map.insert(17, "seventeen");
        assert_eq!(map.chain_histogram()[2], 1);

        assert_eq!(map.get(&1), Some(&"one"));
        assert_eq!(map.get(&17), Some(&"seventeen"));

        assert_eq!(map.remove(&1), Some("one"));
        assert_eq!(map.get(&1), None);
        assert_eq!(map.get(&17), Some(&"seventeen"));

        map.insert(1, "one again");
        assert_eq!(map.remove(&17), Some("seventeen"));
        assert_eq!(map.get(&1), Some(&"one again"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_keys_with_equal_hashes() {
        let mut map: HashMap<Colliding, u32, _> = HashMap::with_hasher(SipHashBuilder::default());
        for n in 0..20u32 {
            assert_eq!(map.insert(Colliding(n), n), None);
        }

        assert_eq!(map.len(), 20);
        assert_eq!(map.chain_histogram().len(), 21);
        for n in 0..20u32 {
            assert_eq!(map.get(&Colliding(n)), Some(&n));
        }

        assert_eq!(map.remove(&Colliding(10)), Some(10));
        assert_eq!(map.get(&Colliding(10)), None);
        assert_eq!(map.get(&Colliding(9)), Some(&9));
        assert_eq!(map.get(&Colliding(11)), Some(&11));
        assert_eq!(map.len(), 19);
    }

    #[test]
    fn test_high_bits_reach_bucket_index() {
        let mut map: HashMap<u64, &str, IdentityState> = HashMap::default();
        assert_eq!(index_for(0x1_0000, 16), index_for(0x2_0000, 16));
        assert_eq!(bucket_of(&map, Some(&0x1_0000)), 1);
        assert_eq!(bucket_of(&map, Some(&0x2_0000)), 2);

        map.insert(0x1_0000, "a");
        map.insert(0x2_0000, "b");
        assert_eq!(map.chain_histogram(), vec![14, 2]);
    }

    #[test]
    fn test_absent_key() {
        let mut map: HashMap<u64, &str, _> = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one");

        assert_eq!(map.insert(None, "a"), None);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(None), Some(&"a"));
        assert!(map.contains_key(None));

        assert_eq!(map.insert(None, "b"), Some("a"));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(None), Some(&"b"));

        if let Some(value) = map.get_mut(None) {
            *value = "c";
        }
        assert_eq!(map.remove(None), Some("c"));
        assert_eq!(map.get(None), None);
        assert!(!map.contains_key(None));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"one"));
    }

    #[test]
    fn test_absent_key_hashes_to_zero() {
        let mut map: HashMap<u64, &str, IdentityState> = HashMap::default();
        assert_eq!(make_hash(&map.hash_builder, None::<&u64>), 0);
        assert_eq!(make_hash(&map.hash_builder, Some(&0u64)), 0);
        assert_eq!(bucket_of(&map, None), 0);

        // `None` and `Some(0)` share a bucket and a hash; only equality
        // tells them apart.
        map.insert(None, "null");
        map.insert(0, "zero");
        assert_eq!(map.chain_histogram()[2], 1);
        assert_eq!(map.get(None), Some(&"null"));
        assert_eq!(map.get(&0), Some(&"zero"));

        assert_eq!(map.remove(&0), Some("zero"));
        assert_eq!(map.get(None), Some(&"null"));
    }

    #[test]
    fn test_absent_key_survives_resize() {
        let mut map: HashMap<u64, u64, _> = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(None, u64::MAX);
        for n in 0..100u64 {
            map.insert(n, n);
        }

        assert_eq!(map.len(), 101);
        assert_eq!(map.get(None), Some(&u64::MAX));
        assert_eq!(map.keys().filter(|k| k.is_none()).count(), 1);
    }

    #[test]
    fn test_clear() {
        let mut map: HashMap<i32, String, _> = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string());
        map.insert(2, "world".to_string());

        assert_eq!(map.len(), 2);
        map.clear();
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
        assert!(!map.contains_key(&1));
        assert!(!map.contains_key(&2));
    }

    #[test]
    fn test_reserve() {
        let mut map: HashMap<i32, String, _> = HashMap::with_hasher(SipHashBuilder::default());
        let initial_capacity = map.capacity();

        map.reserve(1000);
        assert!(map.capacity() >= initial_capacity + 1000);
    }

    #[test]
    fn test_buckets_never_shrink() {
        let mut map: HashMap<u64, u64, _> = HashMap::with_hasher(SipHashBuilder::default());
        for n in 0..200u64 {
            map.insert(n, n);
        }
        let buckets = map.bucket_count();
        assert_eq!(buckets, 512);

        for n in 0..200u64 {
            map.remove(&n);
        }
        assert_eq!(map.bucket_count(), buckets);

        map.insert(1, 1);
        map.clear();
        assert_eq!(map.bucket_count(), buckets);
        assert_eq!(map.drain().count(), 0);
        assert_eq!(map.bucket_count(), buckets);
    }

    #[test]
    fn test_entry_api() {
        let mut map: HashMap<i32, String, _> = HashMap::with_hasher(SipHashBuilder::default());

        let value = map.entry(1).or_insert("hello".to_string());
        assert_eq!(value, &"hello".to_string());
        assert_eq!(map.len(), 1);

        let value = map.entry(1).or_insert("world".to_string());
        assert_eq!(value, &"hello".to_string());
        assert_eq!(map.len(), 1);

        map.entry(2).or_insert_with(|| "computed".to_string());
        assert_eq!(map.get(&2), Some(&"computed".to_string()));

        map.entry(1)
            .and_modify(|v| v.push_str(" world"))
            .or_insert("default".to_string());
        assert_eq!(map.get(&1), Some(&"hello world".to_string()));

        assert_eq!(map.entry(3).key(), Some(&3));
        assert_eq!(map.entry(None).key(), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_entry_or_default() {
        let mut map: HashMap<i32, Vec<i32>, SipHashBuilder> =
            HashMap::with_hasher(SipHashBuilder::default());

        map.entry(1).or_default().push(42);
        assert_eq!(map.get(&1), Some(&vec![42]));

        map.entry(1).or_default().push(24);
        assert_eq!(map.get(&1), Some(&vec![42, 24]));

        map.entry(None).or_default().push(0);
        assert_eq!(map.get(None), Some(&vec![0]));
    }

    #[test]
    fn test_occupied_entry() {
        let mut map: HashMap<i32, String, _> = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string());

        match map.entry(1) {
            Entry::Occupied(mut entry) => {
                assert_eq!(entry.key(), Some(&1));
                assert_eq!(entry.get(), &"hello".to_string());

                *entry.get_mut() = "world".to_string();
                assert_eq!(entry.get(), &"world".to_string());

                let old_value = entry.insert("new".to_string());
                assert_eq!(old_value, "world".to_string());
                assert_eq!(entry.get(), &"new".to_string());

                let (key, value) = entry.remove_entry();
                assert_eq!(key, Some(1));
                assert_eq!(value, "new".to_string());
            }
            Entry::Vacant(_) => panic!("Expected occupied entry"),
        }

        assert!(map.is_empty());
    }

    #[test]
    fn test_vacant_entry() {
        let mut map: HashMap<i32, String, _> = HashMap::with_hasher(SipHashBuilder::default());

        match map.entry(1) {
            Entry::Vacant(entry) => {
                assert_eq!(entry.key(), Some(&1));

                let value = entry.insert("hello".to_string());
                assert_eq!(value, &"hello".to_string());
            }
            Entry::Occupied(_) => panic!("Expected vacant entry"),
        }

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"hello".to_string()));

        match map.entry(2) {
            Entry::Vacant(entry) => assert_eq!(entry.into_key(), Some(2)),
            Entry::Occupied(_) => panic!("Expected vacant entry"),
        }
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_entry_insert_resizes() {
        let mut map: HashMap<u64, u64, _> = HashMap::with_hasher(SipHashBuilder::default());
        for n in 0..12u64 {
            map.entry(n).or_insert(n);
        }
        assert_eq!(map.bucket_count(), 16);

        *map.entry(12).or_insert(0) += 12;
        assert_eq!(map.bucket_count(), 32);
        for n in 0..13u64 {
            assert_eq!(map.get(&n), Some(&n));
        }
    }

    #[test]
    fn test_iterators() {
        let mut map: HashMap<i32, String, _> = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one".to_string());
        map.insert(2, "two".to_string());
        map.insert(3, "three".to_string());
        map.insert(None, "none".to_string());

        assert_eq!(map.iter().len(), 4);
        let pairs: std::collections::HashMap<Option<i32>, String> =
            map.iter().map(|(k, v)| (k.copied(), v.clone())).collect();
        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs.get(&Some(1)), Some(&"one".to_string()));
        assert_eq!(pairs.get(&Some(2)), Some(&"two".to_string()));
        assert_eq!(pairs.get(&Some(3)), Some(&"three".to_string()));
        assert_eq!(pairs.get(&None), Some(&"none".to_string()));

        let keys: std::collections::HashSet<i32> = map.keys().flatten().copied().collect();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&1));
        assert!(keys.contains(&2));
        assert!(keys.contains(&3));

        let values: std::collections::HashSet<String> = map.values().cloned().collect();
        assert_eq!(values.len(), 4);
        assert!(values.contains("one"));
        assert!(values.contains("two"));
        assert!(values.contains("three"));
        assert!(values.contains("none"));
    }

    #[test]
    fn test_drain() {
        let mut map: HashMap<i32, String, _> = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one".to_string());
        map.insert(2, "two".to_string());
        map.insert(3, "three".to_string());

        let drained: std::collections::HashMap<Option<i32>, String> = map.drain().collect();
        assert_eq!(drained.len(), 3);
        assert!(map.is_empty());

        assert_eq!(drained.get(&Some(1)), Some(&"one".to_string()));
        assert_eq!(drained.get(&Some(2)), Some(&"two".to_string()));
        assert_eq!(drained.get(&Some(3)), Some(&"three".to_string()));

        map.insert(4, "four".to_string());
        assert_eq!(map.get(&4), Some(&"four".to_string()));
    }

    #[test]
    fn test_multiple_insertions() {
        let mut map: HashMap<i32, String, _> = HashMap::with_hasher(SipHashBuilder::default());

        for i in 0..100 {
            map.insert(i, format!("value_{}", i));
        }

        assert_eq!(map.len(), 100);
        assert_eq!(map.bucket_count(), 256);

        for i in 0..100 {
            assert_eq!(map.get(&i), Some(&format!("value_{}", i)));
        }
    }

    #[test]
    fn test_bulk_insert_remove() {
        let mut map: HashMap<i32, i32, _> = HashMap::with_hasher(SipHashBuilder::default());

        for i in 0..1000 {
            map.insert(i, i * 2);
        }

        assert_eq!(map.len(), 1000);

        for i in 0..1000 {
            assert_eq!(map.get(&i), Some(&(i * 2)));
        }

        for i in (0..1000).step_by(2) {
            assert_eq!(map.remove(&i), Some(i * 2));
        }

        assert_eq!(map.len(), 500);

        for i in (1..1000).step_by(2) {
            assert_eq!(map.get(&i), Some(&(i * 2)));
        }
        for i in (0..1000).step_by(2) {
            assert!(!map.contains_key(&i));
        }
    }

    #[test]
    fn test_string_keys() {
        let mut map: HashMap<String, i32, _> = HashMap::with_hasher(SipHashBuilder::default());

        map.insert("hello".to_string(), 1);
        map.insert("world".to_string(), 2);
        map.insert("rust".to_string(), 3);

        assert_eq!(map.get(&"hello".to_string()), Some(&1));
        assert_eq!(map.get(&"world".to_string()), Some(&2));
        assert_eq!(map.get(&"rust".to_string()), Some(&3));
        assert_eq!(map.get(&"missing".to_string()), None);
    }

    #[test]
    fn test_default_trait() {
        let map: HashMap<i32, String, SipHashBuilder> = HashMap::default();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
    }

    #[test]
    #[cfg(any(feature = "std", feature = "foldhash"))]
    fn test_default_hash_builder() {
        let mut map: HashMap<&str, i32, crate::DefaultHashBuilder> = HashMap::new();
        map.insert("a", 1);
        map.insert(None, 0);
        assert_eq!(map.get(&"a"), Some(&1));
        assert_eq!(map.get(None), Some(&0));
    }

    #[test]
    fn test_complex_values() {
        let mut map: HashMap<String, Vec<i32>, _> =
            HashMap::with_hasher(SipHashBuilder::default());

        let vec1 = vec![1, 2, 3];
        let vec2 = vec![4, 5, 6];

        map.insert("first".to_string(), vec1.clone());
        map.insert("second".to_string(), vec2.clone());

        assert_eq!(map.get(&"first".to_string()), Some(&vec1));
        assert_eq!(map.get(&"second".to_string()), Some(&vec2));

        if let Some(v) = map.get_mut(&"first".to_string()) {
            v.push(4);
        }

        assert_eq!(map.get(&"first".to_string()), Some(&vec![1, 2, 3, 4]));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut map: HashMap<i32, String, _> = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one".to_string());
        map.insert(None, "none".to_string());

        let mut cloned = map.clone();
        cloned.insert(1, "uno".to_string());
        cloned.remove(None);

        assert_eq!(map.get(&1), Some(&"one".to_string()));
        assert_eq!(map.get(None), Some(&"none".to_string()));
        assert_eq!(cloned.get(&1), Some(&"uno".to_string()));
        assert_eq!(cloned.len(), 1);
    }

    #[test]
    fn test_debug_format() {
        let mut map: HashMap<i32, &str, _> = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "a");
        assert_eq!(format!("{:?}", map), r#"{Some(1): "a"}"#);

        map.remove(&1);
        map.insert(None, "b");
        assert_eq!(format!("{:?}", map), r#"{None: "b"}"#);
    }
}
