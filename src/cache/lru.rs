use std::collections::{HashMap, VecDeque};

/// Bounded map with explicit least-recently-used eviction.
///
/// Deliberately a plain map plus a recency queue rather than a weak-reference
/// scheme: memory behavior stays deterministic and testable.
#[derive(Debug)]
pub(crate) struct LruCache<V> {
    map: HashMap<String, V>,
    /// Keys ordered oldest-first; the back is the most recently used.
    order: VecDeque<String>,
    capacity: usize,
}

impl<V> LruCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Looks up a key, marking it most recently used on a hit.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        if self.map.contains_key(key) {
            self.touch(key);
        }
        self.map.get(key)
    }

    /// Inserts a value, returning the evicted (key, value) if the cache was
    /// at capacity.
    pub fn insert(&mut self, key: String, value: V) -> Option<(String, V)> {
        if self.map.insert(key.clone(), value).is_some() {
            self.touch(&key);
            return None;
        }
        self.order.push_back(key);
        if self.map.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                let evicted = self.map.remove(&oldest)?;
                return Some((oldest, evicted));
            }
        }
        None
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.order.retain(|k| k != key);
        self.map.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    fn touch(&mut self, key: &str) {
        self.order.retain(|k| k != key);
        self.order.push_back(key.to_string());
    }
}
