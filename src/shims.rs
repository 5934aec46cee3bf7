use std::collections::{BTreeMap, BTreeSet};

/// Binding shims keyed by name.
///
/// wry takes init scripts only when the surface is built, so shims installed
/// later are replayed after every page load instead, and shims baked into the
/// surface can only be undone by replaying their removal script.
#[derive(Debug, Default)]
pub(crate) struct Shims {
    /// Waiting for the build, or installed after it.
    live: BTreeMap<String, String>,
    baked: BTreeSet<String>,
    /// Removal scripts for baked shims that were unbound since.
    removed: BTreeMap<String, String>,
}

impl Shims {
    pub(crate) fn install(&mut self, name: &str, shim: &str) {
        self.removed.remove(name);
        if !self.baked.contains(name) {
            self.live.insert(name.to_string(), shim.to_string());
        }
    }

    pub(crate) fn uninstall(&mut self, name: &str, removal: &str) {
        self.live.remove(name);
        if self.baked.contains(name) {
            self.removed.insert(name.to_string(), removal.to_string());
        }
    }

    /// Hand every pending shim to the builder; they now run on each load by themselves.
    pub(crate) fn bake(&mut self) -> Vec<String> {
        let live = std::mem::take(&mut self.live);
        self.baked.extend(live.keys().cloned());
        live.into_values().collect()
    }

    /// Scripts to evaluate after each page load.
    pub(crate) fn replay(&self) -> impl Iterator<Item = &String> {
        self.live.values().chain(self.removed.values())
    }
}
