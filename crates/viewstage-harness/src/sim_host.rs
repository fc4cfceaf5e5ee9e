//! In-memory resource loader and scene host.
//!
//! [`SimLoader`] serves a fixed set of resource paths and counts loads and
//! releases. [`SimHost`] keeps a flat scene of numbered visuals grouped
//! under named parents and builds view behavior from per-path factories.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
};

use viewstage_core::{Instantiated, ResourceLoader, SceneHost, View};

/// Loaded resource handle: the path it was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimResource(pub String);

/// Resource loader over a fixed set of paths.
#[derive(Debug, Default)]
pub struct SimLoader {
    available: BTreeSet<String>,
    held: BTreeMap<String, usize>,
    loads: usize,
    releases: usize,
}

impl SimLoader {
    /// Loader that can serve `paths`.
    pub fn new<P: Into<String>>(paths: impl IntoIterator<Item = P>) -> Self {
        Self { available: paths.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    /// Make another path loadable.
    pub fn add(&mut self, path: impl Into<String>) {
        self.available.insert(path.into());
    }

    /// Total successful loads.
    pub fn loads(&self) -> usize {
        self.loads
    }

    /// Total releases.
    pub fn releases(&self) -> usize {
        self.releases
    }

    /// Handles currently held for `path`.
    pub fn held(&self, path: &str) -> usize {
        self.held.get(path).copied().unwrap_or(0)
    }
}

impl ResourceLoader for SimLoader {
    type Handle = SimResource;

    fn load(&mut self, path: &str) -> Option<SimResource> {
        if !self.available.contains(path) {
            tracing::debug!(path, "resource not found");
            return None;
        }
        self.loads += 1;
        *self.held.entry(path.to_string()).or_insert(0) += 1;
        Some(SimResource(path.to_string()))
    }

    fn release(&mut self, handle: SimResource) {
        self.releases += 1;
        if let Some(count) = self.held.get_mut(&handle.0) {
            *count = count.saturating_sub(1);
        }
    }
}

/// Visual object identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimVisual(pub u32);

/// Builds the behavior attached to a freshly instantiated resource.
/// `None` models a resource without a view component.
pub type ViewFactory = Box<dyn FnMut() -> Option<Box<dyn View>>>;

#[derive(Debug, Clone)]
struct VisualRecord {
    path: String,
    parent: Option<String>,
    enabled: bool,
}

/// Flat scene of visuals with per-parent child ordering.
#[derive(Default)]
pub struct SimHost {
    factories: HashMap<String, ViewFactory>,
    next_visual: u32,
    visuals: BTreeMap<SimVisual, VisualRecord>,
    children: HashMap<String, Vec<SimVisual>>,
    destroyed: Vec<SimVisual>,
}

impl SimHost {
    /// Empty scene without factories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiating `path` attaches whatever `factory` builds.
    pub fn register(&mut self, path: impl Into<String>, factory: ViewFactory) {
        self.factories.insert(path.into(), factory);
    }

    /// Visuals under `parent`, back to front.
    pub fn children(&self, parent: &str) -> &[SimVisual] {
        self.children.get(parent).map(Vec::as_slice).unwrap_or_default()
    }

    /// True if `visual` exists and is enabled.
    pub fn is_enabled(&self, visual: SimVisual) -> bool {
        self.visuals.get(&visual).is_some_and(|record| record.enabled)
    }

    /// Resource path `visual` was instantiated from.
    pub fn path_of(&self, visual: SimVisual) -> Option<&str> {
        self.visuals.get(&visual).map(|record| record.path.as_str())
    }

    /// Number of visuals not yet destroyed.
    pub fn live_visuals(&self) -> usize {
        self.visuals.len()
    }

    /// Destroyed visuals in destruction order.
    pub fn destroyed(&self) -> &[SimVisual] {
        &self.destroyed
    }
}

impl fmt::Debug for SimHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimHost")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .field("visuals", &self.visuals)
            .field("children", &self.children)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl SceneHost<SimResource> for SimHost {
    type Visual = SimVisual;
    type Parent = String;

    fn instantiate(
        &mut self,
        resource: &SimResource,
        parent: Option<&String>,
    ) -> Instantiated<SimVisual> {
        self.next_visual += 1;
        let visual = SimVisual(self.next_visual);

        if let Some(parent) = parent {
            self.children.entry(parent.clone()).or_default().push(visual);
        }
        self.visuals.insert(
            visual,
            VisualRecord { path: resource.0.clone(), parent: parent.cloned(), enabled: false },
        );

        let view = self.factories.get_mut(&resource.0).and_then(|factory| factory());
        Instantiated { visual, view }
    }

    fn child_count(&self, parent: &String) -> usize {
        self.children(parent).len()
    }

    fn set_order(&mut self, visual: &SimVisual, index: usize) {
        let Some(parent) = self.visuals.get(visual).and_then(|record| record.parent.clone()) else {
            return;
        };
        let Some(siblings) = self.children.get_mut(&parent) else {
            return;
        };
        siblings.retain(|sibling| sibling != visual);
        let index = index.min(siblings.len());
        siblings.insert(index, *visual);
    }

    fn set_enabled(&mut self, visual: &SimVisual, enabled: bool) {
        if let Some(record) = self.visuals.get_mut(visual) {
            record.enabled = enabled;
        }
    }

    fn destroy(&mut self, visual: SimVisual) {
        if let Some(record) = self.visuals.remove(&visual) {
            if let Some(parent) = record.parent {
                if let Some(siblings) = self.children.get_mut(&parent) {
                    siblings.retain(|sibling| *sibling != visual);
                }
            }
        }
        self.destroyed.push(visual);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_tracks_held_handles() {
        let mut loader = SimLoader::new(["views/title"]);
        assert!(loader.load("views/missing").is_none());

        let handle = loader.load("views/title").unwrap();
        assert_eq!(loader.held("views/title"), 1);

        loader.release(handle);
        assert_eq!(loader.held("views/title"), 0);
        assert_eq!((loader.loads(), loader.releases()), (1, 1));
    }

    #[test]
    fn ordering_under_parent() {
        let mut host = SimHost::new();
        let root = String::from("root");
        let resource = SimResource(String::from("views/quit"));

        let a = host.instantiate(&resource, Some(&root)).visual;
        let b = host.instantiate(&resource, Some(&root)).visual;
        let c = host.instantiate(&resource, Some(&root)).visual;
        assert_eq!(host.child_count(&root), 3);

        host.set_order(&c, 0);
        assert_eq!(host.children("root"), &[c, a, b]);

        host.destroy(a);
        assert_eq!(host.children("root"), &[c, b]);
        assert_eq!(host.destroyed(), &[a]);
    }

    #[test]
    fn resource_without_factory_has_no_view() {
        let mut host = SimHost::new();
        let created = host.instantiate(&SimResource(String::from("views/bare")), None);
        assert!(created.view.is_none());
        assert!(!host.is_enabled(created.visual));
    }
}
