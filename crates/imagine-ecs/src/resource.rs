use std::any::{Any, TypeId};
use std::collections::HashMap;

/// World-level singletons keyed by type.
///
/// Resources are not attached to any entity. Component hooks read them to
/// react to world state such as the viewport size.
#[derive(Default)]
pub struct Resources {
    values: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a resource, returning the value it replaced.
    pub fn insert<R: 'static + Send + Sync>(&mut self, value: R) -> Option<R> {
        self.values
            .insert(TypeId::of::<R>(), Box::new(value))
            .and_then(|previous| previous.downcast().ok())
            .map(|previous| *previous)
    }

    pub fn get<R: 'static + Send + Sync>(&self) -> Option<&R> {
        self.values
            .get(&TypeId::of::<R>())
            .and_then(|value| value.downcast_ref())
    }

    pub fn get_mut<R: 'static + Send + Sync>(&mut self) -> Option<&mut R> {
        self.values
            .get_mut(&TypeId::of::<R>())
            .and_then(|value| value.downcast_mut())
    }

    pub fn remove<R: 'static + Send + Sync>(&mut self) -> Option<R> {
        self.values
            .remove(&TypeId::of::<R>())
            .and_then(|value| value.downcast().ok())
            .map(|value| *value)
    }

    pub fn contains<R: 'static + Send + Sync>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<R>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Viewport {
        width: u32,
        height: u32,
    }

    #[test]
    fn insert_replaces_and_returns_previous() {
        let mut res = Resources::new();
        assert_eq!(res.insert(Viewport { width: 1, height: 1 }), None);
        let previous = res.insert(Viewport {
            width: 800,
            height: 600,
        });
        assert_eq!(previous, Some(Viewport { width: 1, height: 1 }));
        assert_eq!(res.get::<Viewport>().map(|v| v.width), Some(800));
    }

    #[test]
    fn distinct_types_do_not_collide() {
        let mut res = Resources::new();
        res.insert(7u32);
        res.insert(7u64);
        *res.get_mut::<u32>().unwrap() += 1;
        assert_eq!(res.get::<u32>(), Some(&8));
        assert_eq!(res.get::<u64>(), Some(&7));
    }

    #[test]
    fn remove_resource() {
        let mut res = Resources::new();
        res.insert(String::from("scene"));
        assert_eq!(res.remove::<String>().as_deref(), Some("scene"));
        assert!(!res.contains::<String>());
        assert!(res.get::<String>().is_none());
    }
}
