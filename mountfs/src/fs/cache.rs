//! Kernel-facing attribute cache, adapted from the teacher's
//! `client/src/fs/cache.rs`: same TTL/LRU/None strategy enum, debug
//! `println!`s swapped for `tracing::trace!`.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use fuser::FileAttr;
use lru::LruCache;

use crate::config::{CacheStrategy, Config};

#[derive(Debug)]
struct TtlEntry {
    attr: FileAttr,
    expiry: Instant,
}

#[derive(Debug)]
pub enum AttributeCache {
    Ttl(HashMap<u64, TtlEntry>),
    Lru(LruCache<u64, FileAttr>),
    None,
}

impl AttributeCache {
    pub fn new(config: &Config) -> Self {
        match config.cache_strategy {
            CacheStrategy::Ttl => AttributeCache::Ttl(HashMap::new()),
            CacheStrategy::Lru => {
                let capacity = NonZeroUsize::new(config.cache_lru_capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
                AttributeCache::Lru(LruCache::new(capacity))
            }
            CacheStrategy::None => AttributeCache::None,
        }
    }

    pub fn get(&mut self, ino: &u64) -> Option<FileAttr> {
        match self {
            AttributeCache::Ttl(cache) => {
                if let Some(entry) = cache.get(ino) {
                    if entry.expiry > Instant::now() {
                        tracing::trace!(ino, "attribute cache hit (ttl)");
                        return Some(entry.attr.clone());
                    }
                    tracing::trace!(ino, "attribute cache entry expired");
                    cache.remove(ino);
                }
            }
            AttributeCache::Lru(cache) => {
                if let Some(attr) = cache.get(ino) {
                    tracing::trace!(ino, "attribute cache hit (lru)");
                    return Some(attr.clone());
                }
            }
            AttributeCache::None => {}
        }
        tracing::trace!(ino, "attribute cache miss");
        None
    }

    pub fn put(&mut self, ino: u64, attr: FileAttr, ttl_duration: Duration) {
        match self {
            AttributeCache::Ttl(cache) => {
                cache.insert(ino, TtlEntry { attr, expiry: Instant::now() + ttl_duration });
            }
            AttributeCache::Lru(cache) => {
                cache.put(ino, attr);
            }
            AttributeCache::None => {}
        }
    }

    pub fn remove(&mut self, ino: &u64) {
        match self {
            AttributeCache::Ttl(cache) => {
                cache.remove(ino);
            }
            AttributeCache::Lru(cache) => {
                cache.pop(ino);
            }
            AttributeCache::None => {}
        }
    }
}
