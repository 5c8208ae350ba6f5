//! String interner implementation using DashMap for concurrent access.
//!
//! The table maps strings to dense `u32` indices and back. Strings are
//! allocated once and leaked to obtain `'static` references; the table lives
//! for the program duration and interned strings are never removed, so this
//! costs exactly one allocation per distinct name.
//!
//! Keywords (and a handful of common names) are pre-interned during
//! initialization so they occupy a reserved low index range with stable,
//! predictable indices.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::LazyLock;

use ahash::RandomState;
use dashmap::DashMap;

use super::{Symbol, EXTRA_KNOWN_NAMES, KEYWORD_NAMES};

/// Global string table instance.
///
/// Initialized on first use via `LazyLock`. All keyword names are
/// pre-interned during initialization.
pub static STRING_TABLE: LazyLock<StringTable> = LazyLock::new(|| {
    let table = StringTable::new();
    table.initialize_known_symbols();
    table
});

/// Thread-safe string table.
///
/// Two lock-free maps are kept in step: `names` resolves text to index on
/// intern, `strings` resolves index to text on lookup. Both use the ahash
/// hasher.
pub struct StringTable {
    /// Maps interned text to its symbol index.
    names: DashMap<&'static str, u32, RandomState>,

    /// Maps symbol index back to its text.
    strings: DashMap<u32, &'static str, RandomState>,

    /// Counter for the next index (atomic for lock-free increment).
    next_index: AtomicU32,

    /// Number of intern calls that found an existing entry.
    hits: AtomicUsize,

    /// Number of intern calls that allocated a new entry.
    misses: AtomicUsize,
}

impl StringTable {
    fn new() -> Self {
        Self {
            names: DashMap::with_capacity_and_hasher(256, RandomState::new()),
            strings: DashMap::with_capacity_and_hasher(256, RandomState::new()),
            next_index: AtomicU32::new(0),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Pre-intern every keyword (and a few common names) at fixed indices.
    ///
    /// Must run exactly once, before any other interning, so the keyword
    /// index range is `0..KEYWORD_COUNT` in table order.
    fn initialize_known_symbols(&self) {
        for name in KEYWORD_NAMES.iter().chain(EXTRA_KNOWN_NAMES.iter()).copied() {
            let idx = self.next_index.fetch_add(1, Ordering::Relaxed);
            self.names.insert(name, idx);
            self.strings.insert(idx, name);
        }
    }

    /// Intern a string, returning its symbol.
    ///
    /// Thread-safe; concurrent calls with the same text race benignly to the
    /// same entry.
    pub fn intern(&self, string: &str) -> Symbol {
        // Fast path: already interned.
        if let Some(entry) = self.names.get(string) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Symbol::from_index(*entry.value());
        }

        // Slow path: allocate with 'static lifetime and insert.
        self.misses.fetch_add(1, Ordering::Relaxed);
        let interned: &'static str = Box::leak(string.to_string().into_boxed_str());

        match self.names.entry(interned) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                // Another thread won the race; its entry stands.
                Symbol::from_index(*entry.get())
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                let idx = self.next_index.fetch_add(1, Ordering::Relaxed);
                self.strings.insert(idx, interned);
                entry.insert(idx);
                Symbol::from_index(idx)
            }
        }
    }

    /// Get the text of a symbol.
    pub fn get(&self, symbol: Symbol) -> Option<&'static str> {
        self.strings.get(&symbol.as_u32()).map(|e| *e.value())
    }

    /// Statistics about the string table, for profiling.
    pub fn stats(&self) -> InternerStats {
        InternerStats {
            count: self.strings.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Interner statistics snapshot.
#[derive(Clone, Copy, Debug)]
pub struct InternerStats {
    /// Number of distinct interned strings.
    pub count: usize,
    /// Intern calls that found an existing entry.
    pub hits: usize,
    /// Intern calls that allocated a new entry.
    pub misses: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_get_string() {
        let symbol = STRING_TABLE.intern("test_string");
        assert_eq!(STRING_TABLE.get(symbol), Some("test_string"));
    }

    #[test]
    fn test_known_symbols_preinterned() {
        let stats = STRING_TABLE.stats();
        assert!(stats.count >= KEYWORD_NAMES.len());
    }

    #[test]
    fn test_stats_tracking() {
        let _ = STRING_TABLE.intern("stats_unique_string_98765");
        let _ = STRING_TABLE.intern("stats_unique_string_98765");
        let stats = STRING_TABLE.stats();
        assert!(stats.hits >= 1);
        assert!(stats.misses >= 1);
    }

    #[test]
    fn test_concurrent_same_string() {
        let handles: Vec<_> = (0..10)
            .map(|_| thread::spawn(|| STRING_TABLE.intern("concurrent_same")))
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for symbol in &results[1..] {
            assert_eq!(results[0], *symbol);
        }
    }

    #[test]
    fn test_concurrent_distinct_strings() {
        let handles: Vec<_> = (0..20)
            .map(|i| thread::spawn(move || STRING_TABLE.intern(&format!("thread_{}", i))))
            .collect();

        let symbols: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for i in 0..symbols.len() {
            for j in (i + 1)..symbols.len() {
                assert_ne!(symbols[i], symbols[j]);
            }
        }
    }

    #[test]
    fn test_unicode_strings() {
        for text in ["你好", "🦀", "Привет"] {
            let sym = STRING_TABLE.intern(text);
            assert_eq!(STRING_TABLE.get(sym), Some(text));
        }
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StringTable>();
    }
}
