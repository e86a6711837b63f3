//! Legacy asset-name lookup.
//!
//! Maps a punk's human-readable attribute combination (as returned by the
//! registry's `getPackedAssetNames`) to the id of an original punk that
//! already uses it. Mining a combination in this table would collide with
//! an original punk, so such nonces are rejected.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Subset of the original-punk attribute data shipped with the crate.
/// The complete table is regenerated from the on-chain registry with the
/// operator's own node and dropped in at `data/og_punks.json`; the file
/// format is a flat name-combination -> punk-id JSON object.
const BUNDLED_JSON: &str = include_str!("../data/og_punks.json");

static BUNDLED: Lazy<LegacyPunkIndex> = Lazy::new(|| {
    let by_names: HashMap<String, u64> =
        serde_json::from_str(BUNDLED_JSON).expect("bundled og_punks.json is well-formed");
    LegacyPunkIndex { by_names }
});

/// Immutable name-combination -> original punk id index, built once at
/// startup.
#[derive(Debug, Clone)]
pub struct LegacyPunkIndex {
    by_names: HashMap<String, u64>,
}

impl LegacyPunkIndex {
    /// The index bundled with the binary.
    pub fn bundled() -> &'static LegacyPunkIndex {
        &BUNDLED
    }

    /// Build an index from explicit entries.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            by_names: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Id of the original punk using exactly this attribute combination.
    pub fn lookup(&self, asset_names: &str) -> Option<u64> {
        self.by_names.get(asset_names).copied()
    }

    pub fn len(&self) -> usize {
        self.by_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_names.is_empty()
    }
}
