//! Collaborators supplied by the host application.
//!
//! The controller never renders, loads files, or owns a scene graph. It asks
//! a [`ResourceLoader`] for the backing resource of each view and a
//! [`SceneHost`] to turn that resource into a visual object with a view
//! behavior attached.

use std::fmt;

use crate::view::View;

/// Loads and releases view resources by path.
pub trait ResourceLoader {
    /// Loaded resource.
    type Handle: fmt::Debug;

    /// Load the resource at `path`, or `None` if it does not exist.
    fn load(&mut self, path: &str) -> Option<Self::Handle>;

    /// Release a resource previously returned by [`Self::load`].
    fn release(&mut self, handle: Self::Handle);
}

/// Result of instantiating a resource.
#[derive(Debug)]
pub struct Instantiated<V> {
    /// Visual object created by the host.
    pub visual: V,
    /// Behavior attached to the visual; `None` if the resource has no view
    /// component.
    pub view: Option<Box<dyn View>>,
}

/// Scene graph operations on visual objects.
///
/// `R` is the resource handle type of the paired [`ResourceLoader`].
pub trait SceneHost<R> {
    /// Visual object produced by instantiation.
    type Visual: fmt::Debug;
    /// Container views can be parented under.
    type Parent: fmt::Debug;

    /// Create a visual from `resource`, attached to `parent` if one is given.
    fn instantiate(
        &mut self,
        resource: &R,
        parent: Option<&Self::Parent>,
    ) -> Instantiated<Self::Visual>;

    /// Number of children currently under `parent`.
    fn child_count(&self, parent: &Self::Parent) -> usize;

    /// Move `visual` to position `index` among its siblings.
    fn set_order(&mut self, visual: &Self::Visual, index: usize);

    /// Enable or disable the visual.
    fn set_enabled(&mut self, visual: &Self::Visual, enabled: bool);

    /// Tear down a visual.
    fn destroy(&mut self, visual: Self::Visual);
}
