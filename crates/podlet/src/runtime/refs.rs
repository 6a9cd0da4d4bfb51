//! Container reference tracking.
//!
//! Maps composite container IDs to the object reference their events are
//! attributed to. Set when a container is created, cleared when it is
//! killed; lookups for unknown IDs return `None`.

use std::collections::HashMap;

use parking_lot::RwLock;
use podlet_api::{Container, ObjectReference, Pod};
use podlet_common::{ContainerId, PodletError, PodletResult};

/// Concurrency-safe container ID to object reference map.
#[derive(Debug, Default)]
pub struct ContainerRefManager {
    refs: RwLock<HashMap<ContainerId, ObjectReference>>,
}

impl ContainerRefManager {
    /// Create an empty reference manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `id` to `reference`, replacing any previous binding.
    pub fn set_ref(&self, id: ContainerId, reference: ObjectReference) {
        self.refs.write().insert(id, reference);
    }

    /// Look up the reference bound to `id`.
    #[must_use]
    pub fn get_ref(&self, id: &ContainerId) -> Option<ObjectReference> {
        self.refs.read().get(id).cloned()
    }

    /// Drop the binding for `id`, if any.
    pub fn clear_ref(&self, id: &ContainerId) {
        self.refs.write().remove(id);
    }

    /// Number of tracked containers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.refs.read().len()
    }

    /// Returns true if no container is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.read().is_empty()
    }
}

/// Build the reference events for `container` are attributed to.
///
/// # Errors
///
/// Returns an error if `container` is not part of the pod spec.
pub fn generate_container_ref(pod: &Pod, container: &Container) -> PodletResult<ObjectReference> {
    if pod.find_container(&container.name).is_none() {
        return Err(PodletError::ContainerNotFound {
            name: container.name.clone(),
        });
    }

    Ok(ObjectReference {
        kind: "Pod".to_string(),
        namespace: pod.metadata.namespace.clone(),
        name: pod.metadata.name.clone(),
        uid: pod.metadata.uid.clone(),
        field_path: format!("spec.containers{{{}}}", container.name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn pod() -> Pod {
        let mut pod = Pod::default();
        pod.metadata.name = "web".to_string();
        pod.metadata.namespace = "default".to_string();
        pod.metadata.uid = "uid-1".to_string();
        pod.spec.containers.push(Container {
            name: "nginx".to_string(),
            ..Container::default()
        });
        pod
    }

    #[test]
    fn set_get_clear() {
        let refs = ContainerRefManager::new();
        let id = ContainerId::new("docker", "abc");
        assert!(refs.get_ref(&id).is_none());

        refs.set_ref(id.clone(), ObjectReference::default());
        assert!(refs.get_ref(&id).is_some());
        assert_eq!(refs.len(), 1);

        refs.clear_ref(&id);
        assert!(refs.get_ref(&id).is_none());
        assert!(refs.is_empty());
    }

    #[test]
    fn concurrent_access() {
        let refs = Arc::new(ContainerRefManager::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let refs = Arc::clone(&refs);
                std::thread::spawn(move || {
                    let id = ContainerId::new("docker", format!("c{i}"));
                    refs.set_ref(id.clone(), ObjectReference::default());
                    assert!(refs.get_ref(&id).is_some());
                    if i % 2 == 0 {
                        refs.clear_ref(&id);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(refs.len(), 4);
    }

    #[test]
    fn container_ref_field_path() {
        let pod = pod();
        let reference = generate_container_ref(&pod, &pod.spec.containers[0]).unwrap();
        assert_eq!(reference.kind, "Pod");
        assert_eq!(reference.uid, "uid-1");
        insta::assert_snapshot!(reference.field_path, @"spec.containers{nginx}");
    }

    #[test]
    fn container_ref_for_foreign_container() {
        let stranger = Container {
            name: "stranger".to_string(),
            ..Container::default()
        };
        assert!(generate_container_ref(&pod(), &stranger).is_err());
    }
}
