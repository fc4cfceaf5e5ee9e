//! View registry and per-view resource reference counting.
//!
//! Each registered view owns one [`ViewDescriptor`]. The descriptor loads the
//! backing resource lazily on first use and releases it when its reference
//! count falls back to zero. Counts saturate at zero; unloading an unloaded
//! view is a no-op.

use std::collections::HashMap;

use tracing::warn;

use crate::{
    config::ViewRegistration,
    error::ViewError,
    host::ResourceLoader,
    view::ViewId,
};

/// A registered view and its lazily loaded resource.
#[derive(Debug)]
pub struct ViewDescriptor<R> {
    id: ViewId,
    resource_path: String,
    resource: Option<R>,
    ref_count: u32,
}

impl<R> ViewDescriptor<R> {
    /// Describe an unloaded view.
    pub fn new(id: ViewId, resource_path: impl Into<String>) -> Self {
        Self { id, resource_path: resource_path.into(), resource: None, ref_count: 0 }
    }

    /// Registered identifier.
    pub fn id(&self) -> &ViewId {
        &self.id
    }

    /// Path handed to the resource loader.
    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    /// Current number of users.
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// True while the resource is held.
    pub fn is_loaded(&self) -> bool {
        self.resource.is_some() && self.ref_count > 0
    }

    /// Acquire the resource, loading it on first use.
    ///
    /// # Errors
    /// Returns `MissingResource` if the loader has nothing at the configured
    /// path. The reference count is unchanged in that case.
    pub fn load<L>(&mut self, loader: &mut L) -> Result<&R, ViewError>
    where
        L: ResourceLoader<Handle = R>,
    {
        if self.resource.is_none() {
            let handle = loader.load(&self.resource_path).ok_or_else(|| self.missing())?;
            self.resource = Some(handle);
            self.ref_count = 1;
        } else {
            self.ref_count = self.ref_count.saturating_add(1);
        }

        self.resource.as_ref().ok_or_else(|| self.missing())
    }

    /// Drop one reference, or all of them with `force`.
    ///
    /// Returns true if the resource was released by this call.
    pub fn unload<L>(&mut self, loader: &mut L, force: bool) -> bool
    where
        L: ResourceLoader<Handle = R>,
    {
        self.ref_count = if force { 0 } else { self.ref_count.saturating_sub(1) };
        if self.ref_count > 0 {
            return false;
        }

        match self.resource.take() {
            Some(handle) => {
                loader.release(handle);
                true
            },
            None => false,
        }
    }

    fn missing(&self) -> ViewError {
        ViewError::MissingResource { view: self.id.clone(), path: self.resource_path.clone() }
    }
}

/// All views a controller knows about, keyed by identifier.
#[derive(Debug)]
pub struct ViewRegistry<R> {
    views: HashMap<ViewId, ViewDescriptor<R>>,
}

impl<R> ViewRegistry<R> {
    /// Build a registry from configuration entries.
    ///
    /// Entries with an empty identifier are skipped. Duplicates keep the
    /// first registration.
    pub fn new<'a>(registrations: impl IntoIterator<Item = &'a ViewRegistration>) -> Self {
        let mut views = HashMap::new();
        for registration in registrations {
            if registration.id.as_str().is_empty() {
                warn!(
                    path = %registration.resource_path,
                    "skipping view registration without an id"
                );
                continue;
            }
            if views.contains_key(&registration.id) {
                warn!(view = %registration.id, "duplicate view registration ignored");
                continue;
            }
            views.insert(
                registration.id.clone(),
                ViewDescriptor::new(registration.id.clone(), registration.resource_path.clone()),
            );
        }
        Self { views }
    }

    /// True if `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.views.contains_key(id)
    }

    /// Descriptor for `id`.
    pub fn get(&self, id: &str) -> Option<&ViewDescriptor<R>> {
        self.views.get(id)
    }

    /// Mutable descriptor for `id`.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut ViewDescriptor<R>> {
        self.views.get_mut(id)
    }

    /// Number of registered views.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Number of views whose resource is currently held.
    pub fn loaded_count(&self) -> usize {
        self.views.values().filter(|descriptor| descriptor.is_loaded()).count()
    }

    /// Force every descriptor back to zero, releasing held resources.
    pub fn unload_all<L>(&mut self, loader: &mut L)
    where
        L: ResourceLoader<Handle = R>,
    {
        for descriptor in self.views.values_mut() {
            descriptor.unload(loader, true);
        }
    }
}
