use crate::FetchFunction;
use bumpalo::Bump;
use log::debug;
use slotmap::SlotMap;
use std::collections::HashMap;
use vfetch_core::FetchDescriptor;

slotmap::new_key_type! {
    /// Handle of a function compiled by a [`FetchCache`].
    pub struct FetchKey;
}

/// Compiled fetch functions, one per distinct descriptor.
pub struct FetchCache {
    functions: SlotMap<FetchKey, FetchFunction>,
    keys: HashMap<FetchDescriptor, FetchKey>,
    arena: Bump,
}

impl FetchCache {
    pub fn new() -> Self {
        Self {
            functions: SlotMap::with_key(),
            keys: HashMap::new(),
            arena: Bump::new(),
        }
    }

    /// Returns the key of the function for `descriptor`, compiling it on first use.
    pub fn get_or_compile(&mut self, descriptor: &FetchDescriptor) -> FetchKey {
        if let Some(key) = self.keys.get(descriptor) {
            return *key;
        }

        let function = FetchFunction::compile(&self.arena, descriptor);
        self.arena.reset();

        let key = self.functions.insert(function);
        self.keys.insert(descriptor.clone(), key);
        debug!("cached fetch function {key:?}, {} total", self.functions.len());

        key
    }

    pub fn get(&self, key: FetchKey) -> Option<&FetchFunction> {
        self.functions.get(key)
    }

    /// Drop a function; its descriptor compiles anew on the next request.
    pub fn remove(&mut self, key: FetchKey) -> bool {
        if self.functions.remove(key).is_none() {
            return false;
        }

        self.keys.retain(|_, k| *k != key);
        true
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for FetchCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfetch_core::{FetchStrategy, Format, IndexType, InputElement};

    fn descriptor(strategy: FetchStrategy) -> FetchDescriptor {
        FetchDescriptor::new(IndexType::U32, vec![InputElement::new(0, 0, Format::R32G32B32A32_FLOAT)])
            .unwrap()
            .with_strategy(strategy)
    }

    #[test]
    fn equal_descriptors_share_a_function() {
        let mut cache = FetchCache::new();

        let a = cache.get_or_compile(&descriptor(FetchStrategy::Gather));
        let b = cache.get_or_compile(&descriptor(FetchStrategy::Gather));
        let c = cache.get_or_compile(&descriptor(FetchStrategy::Linear));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(c).map(|f| f.strategy()), Some(FetchStrategy::Linear));
    }

    #[test]
    fn removed_functions_recompile() {
        let mut cache = FetchCache::new();

        let a = cache.get_or_compile(&descriptor(FetchStrategy::Gather));
        assert!(cache.remove(a));
        assert!(!cache.remove(a));
        assert!(cache.get(a).is_none());
        assert!(cache.is_empty());

        let b = cache.get_or_compile(&descriptor(FetchStrategy::Gather));
        assert_ne!(a, b);
        assert!(cache.get(b).is_some());
    }
}
