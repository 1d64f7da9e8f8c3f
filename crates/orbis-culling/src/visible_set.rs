use orbis_cubesphere::TileKey;
use rustc_hash::FxHashSet;

/// Keys judged visible on the current tick.
///
/// Rebuilt from scratch every gated tick and consulted by the visibility
/// sweep; membership tests are O(1).
#[derive(Debug, Default, Clone)]
pub struct VisibleSet {
    keys: FxHashSet<TileKey>,
}

impl VisibleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with `keys`, reusing the allocation.
    pub fn refill(&mut self, keys: impl IntoIterator<Item = TileKey>) {
        self.keys.clear();
        self.keys.extend(keys);
    }

    pub fn insert(&mut self, key: TileKey) -> bool {
        self.keys.insert(key)
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileKey> {
        self.keys.iter()
    }
}

impl FromIterator<TileKey> for VisibleSet {
    fn from_iter<I: IntoIterator<Item = TileKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
