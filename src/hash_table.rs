//! The raw separate-chaining table underneath [`HashMap`](crate::HashMap).

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::marker::PhantomData;

/// Number of buckets a freshly created table starts with.
const DEFAULT_BUCKETS: usize = 16;

/// Largest population a table with `bucket_count` buckets holds before it
/// doubles: `floor(bucket_count * 0.75)`.
#[inline(always)]
fn target_load_factor(bucket_count: usize) -> usize {
    ((bucket_count as u128 * 3) / 4) as usize
}

#[inline(always)]
fn target_load_factor_inverse(capacity: usize) -> usize {
    ((capacity as u128 * 4).div_ceil(3)) as usize
}

/// Smallest power-of-two bucket count (never below the default) whose load
/// limit fits `capacity` entries.
#[inline(always)]
fn bucket_count_for(capacity: usize) -> usize {
    target_load_factor_inverse(capacity)
        .next_power_of_two()
        .max(DEFAULT_BUCKETS)
}

/// Maps a hash to the bucket it belongs to in a table of `bucket_count`
/// buckets.
///
/// `bucket_count` must be a power of two, which makes masking the low bits
/// equivalent to `hash % bucket_count`.
///
/// # Examples
///
/// ```rust
/// # use chain_hash::hash_table::index_for;
/// #
/// assert_eq!(index_for(0x25, 16), 0x5);
/// assert_eq!(index_for(0x25, 32), 0x5);
/// assert_eq!(index_for(0x35, 32), 0x15);
/// ```
#[inline(always)]
pub fn index_for(hash: u64, bucket_count: usize) -> usize {
    debug_assert!(bucket_count.is_power_of_two());
    hash as usize & (bucket_count - 1)
}

type Link<V> = Option<Box<Node<V>>>;

struct Node<V> {
    hash: u64,
    value: V,
    next: Link<V>,
}

impl<V> Node<V> {
    #[inline(always)]
    fn matches(&self, hash: u64, eq: impl Fn(&V) -> bool) -> bool {
        self.hash == hash && eq(&self.value)
    }
}

fn empty_buckets<V>(bucket_count: usize) -> Vec<Link<V>> {
    let mut buckets = Vec::with_capacity(bucket_count);
    buckets.resize_with(bucket_count, || None);
    buckets
}

/// Drops a chain one node at a time instead of letting `Box` recurse down it.
fn drop_chain<V>(mut link: Link<V>) {
    while let Some(mut node) = link {
        link = node.next.take();
    }
}

/// Walks `link` forward to the slot holding the first matching node, or to the
/// empty slot that terminates the chain.
fn find_link<V>(mut link: &mut Link<V>, hash: u64, eq: impl Fn(&V) -> bool) -> &mut Link<V> {
    while link.as_ref().is_some_and(|node| !node.matches(hash, &eq)) {
        if let Some(node) = link {
            link = &mut node.next;
        }
    }
    link
}

/// Iterates the nodes of a single chain, head first.
struct Chain<'a, V> {
    link: Option<&'a Node<V>>,
}

impl<'a, V> Iterator for Chain<'a, V> {
    type Item = &'a Node<V>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.link?;
        self.link = node.next.as_deref();
        Some(node)
    }
}

#[inline(always)]
fn chain<V>(link: &Link<V>) -> Chain<'_, V> {
    Chain {
        link: link.as_deref(),
    }
}

/// Chain-length and memory statistics for a [`HashTable`].
///
/// Available in tests and with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of elements currently in the table
    pub populated: usize,
    /// Population at which the next insertion triggers a resize
    pub capacity: usize,
    /// Length of the bucket array
    pub buckets: usize,
    /// Number of buckets holding at least one element
    pub occupied_buckets: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
    /// Load factor (populated / buckets)
    pub load_factor: f64,
    /// Bucket utilization (occupied_buckets / buckets)
    pub bucket_utilization: f64,
    /// Mean chain length over occupied buckets
    pub average_chain: f64,
    /// Total heap memory in bytes used by the bucket array and nodes
    pub total_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.buckets,
            self.load_factor * 100.0
        );
        println!("Resize at: {} entries", self.capacity + 1);
        println!(
            "Bucket Usage: {}/{} ({:.2}% utilization)",
            self.occupied_buckets,
            self.buckets,
            self.bucket_utilization * 100.0
        );
        println!(
            "Chains: longest {}, average {:.02}",
            self.longest_chain, self.average_chain
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
    }
}

/// A hash table resolving collisions by separate chaining.
///
/// `HashTable<V>` stores values of type `V` in a power-of-two array of
/// buckets, each bucket owning a singly linked chain of nodes. Every node
/// caches the hash it was inserted with. Unlike standard hash maps, this
/// table requires you to provide both the hash value and an equality predicate
/// for each operation.
///
/// ## Growth
///
/// A new table has 16 buckets. Once an insertion would take the population
/// past three quarters of the bucket count, the bucket array doubles and every
/// node is relinked using its cached hash. The bucket array never shrinks.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use chain_hash::hash_table::HashTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # #[derive(Debug, PartialEq)]
/// # struct Person {
/// #     id: u64,
/// #     name: String,
/// # }
/// #
/// # fn hash_id(id: u64) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     id.hash(&mut hasher);
/// #     hasher.finish()
/// # }
///
/// let mut table = HashTable::new();
/// let hash = hash_id(123);
///
/// // Insert a person
/// match table.entry(hash, |p: &Person| p.id == 123) {
///     chain_hash::hash_table::Entry::Vacant(entry) => {
///         entry.insert(Person {
///             id: 123,
///             name: "Alice".to_string(),
///         });
///     }
///     chain_hash::hash_table::Entry::Occupied(_) => {
///         println!("Person already exists");
///     }
/// }
///
/// assert_eq!(table.find(hash, |p| p.id == 123).map(|p| p.name.as_str()), Some("Alice"));
/// ```
pub struct HashTable<V> {
    buckets: Vec<Link<V>>,
    populated: usize,
    max_pop: usize,
}

struct DebugChain<'a, V>(&'a Link<V>);

impl<V: Debug> Debug for DebugChain<'_, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(chain(self.0).map(|node| (node.hash, &node.value)))
            .finish()
    }
}

impl<V: Debug> Debug for HashTable<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        struct Buckets<'a, V>(&'a [Link<V>]);

        impl<V: Debug> Debug for Buckets<'_, V> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut map = f.debug_map();
                for (index, link) in self.0.iter().enumerate() {
                    if link.is_some() {
                        map.entry(&index, &DebugChain(link));
                    }
                }
                map.finish()
            }
        }

        f.debug_struct("HashTable")
            .field("populated", &self.populated)
            .field("max_pop", &self.max_pop)
            .field("bucket_count", &self.buckets.len())
            .field("buckets", &Buckets(&self.buckets))
            .finish()
    }
}

impl<V> Clone for HashTable<V>
where
    V: Clone,
{
    fn clone(&self) -> Self {
        let mut buckets = empty_buckets(self.buckets.len());
        for (target, source) in buckets.iter_mut().zip(self.buckets.iter()) {
            let mut tail = target;
            for node in chain(source) {
                tail = &mut tail
                    .insert(Box::new(Node {
                        hash: node.hash,
                        value: node.value.clone(),
                        next: None,
                    }))
                    .next;
            }
        }

        Self {
            buckets,
            populated: self.populated,
            max_pop: self.max_pop,
        }
    }
}

impl<V> Drop for HashTable<V> {
    fn drop(&mut self) {
        for link in self.buckets.iter_mut() {
            drop_chain(link.take());
        }
    }
}

impl<V> Default for HashTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HashTable<V> {
    /// Creates an empty table with the default 16 buckets.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::new();
    /// assert_eq!(table.bucket_count(), 16);
    /// assert_eq!(table.capacity(), 12);
    /// ```
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new hash table with the specified capacity.
    ///
    /// The bucket array is sized to the smallest power of two (at least 16)
    /// that holds `capacity` elements without resizing, so the actual capacity
    /// may be larger than requested.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// // Create a table that can hold at least 100 items without resizing
    /// let table: HashTable<String> = HashTable::with_capacity(100);
    /// assert!(table.capacity() >= 100);
    /// assert!(table.bucket_count().is_power_of_two());
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        let bucket_count = bucket_count_for(capacity);
        Self {
            buckets: empty_buckets(bucket_count),
            populated: 0,
            max_pop: target_load_factor(bucket_count),
        }
    }

    /// Returns an iterator over all values in the table.
    ///
    /// Values are visited bucket by bucket, each chain from its head. The
    /// order is otherwise unspecified.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use chain_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// for n in 0..4u64 {
    ///     table.entry(hash_u64(n), |&v: &u64| v == n).or_insert(n);
    /// }
    ///
    /// let mut values: Vec<u64> = table.iter().copied().collect();
    /// values.sort();
    /// assert_eq!(values, vec![0, 1, 2, 3]);
    /// ```
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            buckets: self.buckets.iter(),
            chain: Chain { link: None },
            remaining: self.populated,
        }
    }

    /// Removes every value from the table, returning them through an iterator.
    ///
    /// The table is empty as soon as this returns, even if the iterator is
    /// dropped before it is exhausted. The bucket array is kept.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use chain_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(hash_u64(1), |&n: &u64| n == 1).or_insert(1);
    /// table.entry(hash_u64(2), |&n: &u64| n == 2).or_insert(2);
    ///
    /// let mut drained: Vec<u64> = table.drain().collect();
    /// drained.sort();
    /// assert_eq!(drained, vec![1, 2]);
    /// assert!(table.is_empty());
    /// ```
    pub fn drain(&mut self) -> Drain<'_, V> {
        let remaining = core::mem::replace(&mut self.populated, 0);
        let bucket_count = self.buckets.len();
        let buckets = core::mem::replace(&mut self.buckets, empty_buckets(bucket_count));
        Drain {
            buckets: buckets.into_iter(),
            chain: None,
            remaining,
            _table: PhantomData,
        }
    }

    /// Returns `true` if the table contains no elements.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<i32> = HashTable::with_capacity(10);
    /// assert!(table.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of elements in the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use chain_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::with_capacity(10);
    /// assert_eq!(table.len(), 0);
    ///
    /// table.entry(hash_u64(1), |&n: &u64| n == 1).or_insert(1);
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Removes all elements from the table.
    ///
    /// The bucket array keeps its current length.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use chain_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::with_capacity(10);
    /// table.entry(hash_u64(1), |&n: &u64| n == 1).or_insert(1);
    /// table.entry(hash_u64(2), |&n: &u64| n == 2).or_insert(2);
    /// assert_eq!(table.len(), 2);
    ///
    /// table.clear();
    /// assert_eq!(table.len(), 0);
    /// assert!(table.is_empty());
    /// ```
    pub fn clear(&mut self) {
        for link in self.buckets.iter_mut() {
            drop_chain(link.take());
        }
        self.populated = 0;
    }

    /// Reserves capacity for at least `additional` more elements.
    ///
    /// Grows the bucket array to the smallest power of two that fits
    /// `len() + additional` elements. Does nothing if they already fit.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// table.reserve(100);
    /// assert!(table.capacity() >= 100);
    /// assert_eq!(table.bucket_count(), 256);
    /// ```
    pub fn reserve(&mut self, additional: usize) {
        let wanted = self.populated.saturating_add(additional);
        if wanted > self.max_pop {
            self.rehash(bucket_count_for(wanted));
        }
    }

    /// Removes the value matching `hash` and `eq`, returning it if present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use chain_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(hash_u64(7), |&n: &u64| n == 7).or_insert(7);
    ///
    /// assert_eq!(table.remove(hash_u64(7), |&n| n == 7), Some(7));
    /// assert_eq!(table.remove(hash_u64(7), |&n| n == 7), None);
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<V> {
        let index = index_for(hash, self.buckets.len());
        let link = find_link(&mut self.buckets[index], hash, eq);

        let node = link.take()?;
        let Node { value, next, .. } = *node;
        *link = next;

        self.populated -= 1;
        Some(value)
    }

    /// Gets the entry matching `hash` and `eq` for in-place manipulation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use chain_hash::hash_table::Entry;
    /// # use chain_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_str(s: &str) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     s.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// let hash = hash_str("key");
    ///
    /// match table.entry(hash, |s: &String| s == "key") {
    ///     Entry::Vacant(entry) => {
    ///         entry.insert("key".to_string());
    ///     }
    ///     Entry::Occupied(_) => unreachable!(),
    /// }
    ///
    /// assert!(matches!(
    ///     table.entry(hash, |s: &String| s == "key"),
    ///     Entry::Occupied(_)
    /// ));
    /// ```
    pub fn entry(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Entry<'_, V> {
        let index = index_for(hash, self.buckets.len());
        let table: *mut Self = self;

        // SAFETY: `table` was just derived from `self`, which stays mutably
        // borrowed for the lifetime of the returned entry. The slot borrow is
        // only kept on the occupied path, where it is paired with the disjoint
        // `populated` field. On the vacant path the slot borrow is dead before
        // the whole table is reborrowed.
        let link = find_link(unsafe { &mut (&mut (*table).buckets)[index] }, hash, eq);
        if link.is_some() {
            return Entry::Occupied(OccupiedEntry {
                link,
                // SAFETY: see above; `populated` does not overlap `buckets`.
                populated: unsafe { &mut (*table).populated },
            });
        }

        // SAFETY: see above; nothing derived from the slot borrow is used
        // past this point.
        Entry::Vacant(VacantEntry {
            table: unsafe { &mut *table },
            hash,
        })
    }

    /// Finds the value matching `hash` and `eq`.
    ///
    /// Only the bucket `hash` maps to is searched. Within it, each node's
    /// cached hash is compared before `eq` is called.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use chain_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(hash_u64(1), |&n: &u64| n == 1).or_insert(1);
    ///
    /// assert_eq!(table.find(hash_u64(1), |&n| n == 1), Some(&1));
    /// assert_eq!(table.find(hash_u64(2), |&n| n == 2), None);
    /// ```
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        let index = index_for(hash, self.buckets.len());
        chain(&self.buckets[index])
            .find(|node| node.matches(hash, &eq))
            .map(|node| &node.value)
    }

    /// Finds the value matching `hash` and `eq`, returning a mutable
    /// reference.
    ///
    /// The cached hash of the node is unaffected, so the caller must not
    /// change whatever part of the value `hash` was derived from.
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        let index = index_for(hash, self.buckets.len());
        find_link(&mut self.buckets[index], hash, eq)
            .as_mut()
            .map(|node| &mut node.value)
    }

    #[inline]
    #[cold]
    fn resize(&mut self) {
        self.rehash(self.buckets.len() * 2);
    }

    fn rehash(&mut self, bucket_count: usize) {
        debug_assert!(bucket_count.is_power_of_two());
        debug_assert!(bucket_count > self.buckets.len());

        let old_buckets = core::mem::replace(&mut self.buckets, empty_buckets(bucket_count));
        self.max_pop = target_load_factor(bucket_count);

        for mut link in old_buckets {
            while let Some(mut node) = link {
                link = node.next.take();

                let head = &mut self.buckets[index_for(node.hash, bucket_count)];
                node.next = head.take();
                *head = Some(node);
            }
        }
    }

    /// Returns the number of elements the table holds before its next resize.
    ///
    /// This is three quarters of [`bucket_count`](Self::bucket_count),
    /// rounded down.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<u64> = HashTable::with_capacity(13);
    /// assert_eq!(table.bucket_count(), 32);
    /// assert_eq!(table.capacity(), 24);
    /// ```
    pub fn capacity(&self) -> usize {
        self.max_pop
    }

    /// Returns the length of the bucket array. Always a power of two.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Computes a histogram of chain lengths for the current table state.
    ///
    /// Entry `n` of the returned vector is the number of buckets whose chain
    /// holds exactly `n` values; the last entry is therefore the longest
    /// chain. Entry 0 counts the empty buckets.
    ///
    /// Available in tests and with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_histogram(&self) -> Vec<usize> {
        let mut hist = alloc::vec![0usize; 1];
        for link in self.buckets.iter() {
            let len = chain(link).count();
            if hist.len() <= len {
                hist.resize(len + 1, 0);
            }
            hist[len] += 1;
        }
        hist
    }

    /// Returns chain-length and memory statistics for debugging.
    ///
    /// Available in tests and with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let hist = self.chain_histogram();
        let buckets = self.buckets.len();
        let occupied_buckets = buckets - hist[0];

        DebugStats {
            populated: self.populated,
            capacity: self.max_pop,
            buckets,
            occupied_buckets,
            longest_chain: hist.len() - 1,
            load_factor: self.populated as f64 / buckets as f64,
            bucket_utilization: occupied_buckets as f64 / buckets as f64,
            average_chain: if occupied_buckets == 0 {
                0.0
            } else {
                self.populated as f64 / occupied_buckets as f64
            },
            total_bytes: buckets * core::mem::size_of::<Link<V>>()
                + self.populated * core::mem::size_of::<Node<V>>(),
        }
    }

    /// Pretty-prints the chain-length histogram horizontally using stdout.
    ///
    /// Requires the `std` feature. Each row is one chain length, with a bar
    /// proportional to how many buckets have a chain of that length.
    #[cfg(all(any(test, feature = "stats"), feature = "std"))]
    pub fn print_chain_histogram(&self) {
        let hist = self.chain_histogram();
        let max = *hist.iter().max().unwrap_or(&0);
        if self.populated == 0 {
            println!("chain histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!(
            "chain histogram ({} entries, {} buckets):",
            self.populated,
            self.buckets.len()
        );

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 || max == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = ['▏', '▎', '▍', '▌', '▋', '▊', '▉'];
            if units % 8 > 0 {
                bar.push(partial[units % 8 - 1]);
            }
            bar
        };

        for (len, &count) in hist.iter().enumerate() {
            println!("{:>3} | {} ({})", len, make_bar(count), count);
        }
    }
}

/// A view into a single entry in the hash table, which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, V> {
    /// A vacant entry - no value in the table matches
    Vacant(VacantEntry<'a, V>),
    /// An occupied entry - a matching value is present in the table
    Occupied(OccupiedEntry<'a, V>),
}

impl<'a, V> Entry<'a, V> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value in the entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use chain_hash::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_str(s: &str) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     s.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// let hash = hash_str("key");
    ///
    /// // Insert if not present
    /// let value = table
    ///     .entry(hash, |s: &String| s == "key")
    ///     .or_insert("key".to_string());
    /// assert_eq!(value, "key");
    ///
    /// // Get existing value
    /// let existing = table
    ///     .entry(hash, |s: &String| s == "key")
    ///     .or_insert("other".to_string());
    /// assert_eq!(existing, "key");
    /// ```
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the value in the entry.
    ///
    /// `default` is only called when the entry is vacant.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Calls `f` on the value if the entry is occupied.
    ///
    /// Returns a mutable reference to the modified value, or `None` if the
    /// entry was vacant.
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Option<&'a mut V> {
        match self {
            Entry::Occupied(entry) => {
                let value = entry.into_mut();
                f(value);
                Some(value)
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Inserts `V::default()` if the entry is vacant and returns a mutable
    /// reference to the value in the entry.
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the hash table.
///
/// This struct is created by the [`entry`] method on [`HashTable`] when no
/// value matches.
///
/// [`entry`]: HashTable::entry
pub struct VacantEntry<'a, V> {
    table: &'a mut HashTable<V>,
    hash: u64,
}

impl<'a, V> VacantEntry<'a, V> {
    /// Returns the hash this entry will be stored under.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Inserts a value into the vacant entry and returns a mutable reference to
    /// it.
    ///
    /// The value becomes the head of its bucket's chain. If the insertion takes
    /// the population past [`capacity`](HashTable::capacity), the bucket array
    /// doubles first.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::hash_table::Entry;
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// # fn hash_str(s: &str) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     s.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// let hash = hash_str("key");
    ///
    /// match table.entry(hash, |s: &String| s == "key") {
    ///     Entry::Vacant(entry) => {
    ///         let value_ref = entry.insert("value".to_string());
    ///         assert_eq!(value_ref, "value");
    ///     }
    ///     Entry::Occupied(_) => unreachable!("Entry should be vacant"),
    /// }
    /// ```
    pub fn insert(self, value: V) -> &'a mut V {
        let table = self.table;
        // Grow before linking: the returned reference outlives this call.
        if table.populated >= table.max_pop {
            table.resize();
        }
        table.populated += 1;
        debug_assert!(table.populated <= table.max_pop);

        let index = index_for(self.hash, table.buckets.len());
        let head = &mut table.buckets[index];
        let next = head.take();
        &mut head
            .insert(Box::new(Node {
                hash: self.hash,
                value,
                next,
            }))
            .value
    }
}

/// A view into an occupied entry in the hash table.
///
/// This struct is created by the [`entry`] method on [`HashTable`] when a
/// matching value is present. It provides methods to access, modify, or
/// remove the existing value.
///
/// [`entry`]: HashTable::entry
pub struct OccupiedEntry<'a, V> {
    link: &'a mut Link<V>,
    populated: &'a mut usize,
}

impl<'a, V> OccupiedEntry<'a, V> {
    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.node().value
    }

    /// Gets a mutable reference to the value in the entry.
    ///
    /// The cached hash is unaffected, so the caller must not change whatever
    /// part of the value the hash was derived from.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.node_mut().value
    }

    /// Converts the entry into a mutable reference to the value, bound to the
    /// lifetime of the table borrow.
    pub fn into_mut(self) -> &'a mut V {
        let link = self.link;
        &mut link
            .as_deref_mut()
            .expect("occupied entry points at a linked node")
            .value
    }

    /// Returns the hash the value was stored under.
    pub fn hash(&self) -> u64 {
        self.node().hash
    }

    /// Unlinks the entry from its chain and returns the value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::hash_table::Entry;
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(hash_u64(5), |&n: &u64| n == 5).or_insert(5);
    ///
    /// match table.entry(hash_u64(5), |&n: &u64| n == 5) {
    ///     Entry::Occupied(entry) => assert_eq!(entry.remove(), 5),
    ///     Entry::Vacant(_) => unreachable!(),
    /// }
    /// assert!(table.is_empty());
    /// ```
    pub fn remove(self) -> V {
        let node = self
            .link
            .take()
            .expect("occupied entry points at a linked node");
        let Node { value, next, .. } = *node;
        *self.link = next;
        *self.populated -= 1;
        value
    }

    #[inline(always)]
    fn node(&self) -> &Node<V> {
        self.link
            .as_deref()
            .expect("occupied entry points at a linked node")
    }

    #[inline(always)]
    fn node_mut(&mut self) -> &mut Node<V> {
        self.link
            .as_deref_mut()
            .expect("occupied entry points at a linked node")
    }
}

/// An iterator over the values of a [`HashTable`].
///
/// This struct is created by [`HashTable::iter`].
pub struct Iter<'a, V> {
    buckets: core::slice::Iter<'a, Link<V>>,
    chain: Chain<'a, V>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.chain.next() {
                self.remaining -= 1;
                return Some(&node.value);
            }
            self.chain = chain(self.buckets.next()?);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

/// A draining iterator over the values of a [`HashTable`].
///
/// This struct is created by [`HashTable::drain`]. It owns the chains it
/// drains, so the table is already empty while it runs. Values not yet yielded
/// when it is dropped are dropped with it.
pub struct Drain<'a, V> {
    buckets: alloc::vec::IntoIter<Link<V>>,
    chain: Link<V>,
    remaining: usize,
    _table: PhantomData<&'a mut HashTable<V>>,
}

impl<V> Drop for Drain<'_, V> {
    fn drop(&mut self) {
        for _ in self {}
    }
}

impl<'a, V> Iterator for Drain<'a, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.chain.take() {
                let Node { value, next, .. } = *node;
                self.chain = next;
                self.remaining -= 1;
                return Some(value);
            }
            self.chain = self.buckets.next()?;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Drain<'_, V> {}
