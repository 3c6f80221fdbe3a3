// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A thread-safe, type-keyed service locator.
//!
//! The [`ServiceRegistry`] lets subsystems publish shared handles to services
//! (e.g. `Arc<dyn RenderNotificationService>`) and lets components resolve them
//! lazily without knowing who provides them. Services may be registered or
//! removed at any time, so consumers resolve them again whenever they need them.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A service registry keyed by [`TypeId`].
///
/// Services are stored by value and handed out as clones, so register cheap
/// handles such as `Arc<T>` or `Arc<dyn Trait>`.
///
/// # Example
///
/// ```rust
/// use framecap_core::ServiceRegistry;
/// use std::sync::Arc;
///
/// struct Clock { hz: u32 }
///
/// let registry = ServiceRegistry::new();
/// registry.insert(Arc::new(Clock { hz: 60 }));
///
/// let clock = registry.get::<Arc<Clock>>().unwrap();
/// assert_eq!(clock.hz, 60);
/// ```
#[derive(Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl ServiceRegistry {
    /// Creates an empty service registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<TypeId, Box<dyn Any + Send + Sync>>> {
        self.services
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TypeId, Box<dyn Any + Send + Sync>>> {
        self.services
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Inserts a service, keyed by `T`'s [`TypeId`], replacing any previous one.
    pub fn insert<T: Send + Sync + 'static>(&self, service: T) {
        self.write().insert(TypeId::of::<T>(), Box::new(service));
    }

    /// Returns a clone of the registered service of type `T`, if any.
    #[must_use]
    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.read()
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .cloned()
    }

    /// Removes and returns the service of type `T`.
    pub fn remove<T: Send + Sync + 'static>(&self) -> Option<T> {
        self.write()
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Returns `true` if a service of type `T` is registered.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.read().contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.len())
            .finish()
    }
}
