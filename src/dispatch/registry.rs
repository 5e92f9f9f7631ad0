// Category registry
//
// Category -> ordered handler list. Append-only: entries are never removed
// explicitly, but handlers are held weakly so a dropped surface stops
// receiving traffic and its entry is pruned on the next registration.

use super::handler::Handler;
use crate::models::Category;
use indexmap::IndexMap;
use std::sync::{Arc, Weak};

#[derive(Default)]
pub struct CategoryRegistry {
    entries: IndexMap<Category, Vec<Weak<dyn Handler>>>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` under `category`. No deduplication: registering the
    /// same handler twice makes it receive every broadcast twice.
    pub fn register(&mut self, category: Category, handler: &Arc<dyn Handler>) {
        self.prune();
        self.entries
            .entry(category)
            .or_default()
            .push(Arc::downgrade(handler));
    }

    /// Handlers for `category` in registration order, dead ones included.
    ///
    /// The list is a copy so callers can invoke handlers without holding the
    /// registry lock.
    pub fn lookup(&self, category: Category) -> Vec<Weak<dyn Handler>> {
        self.entries.get(&category).cloned().unwrap_or_default()
    }

    /// First registered handler for `category` that is still alive.
    ///
    /// Returned weakly so the caller can hand it to the owning thread without
    /// taking part in the handler's lifetime.
    pub fn first_live(&self, category: Category) -> Option<Weak<dyn Handler>> {
        self.entries
            .get(&category)?
            .iter()
            .find(|h| h.strong_count() > 0)
            .cloned()
    }

    /// Number of live registrations under `category`.
    pub fn handler_count(&self, category: Category) -> usize {
        self.entries
            .get(&category)
            .map(|list| list.iter().filter(|h| h.strong_count() > 0).count())
            .unwrap_or(0)
    }

    /// Categories with at least one registration, in first-registration order.
    pub fn categories(&self) -> Vec<Category> {
        self.entries
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(category, _)| *category)
            .collect()
    }

    /// Drop entries whose handler no longer exists.
    fn prune(&mut self) {
        let mut pruned = 0usize;
        for list in self.entries.values_mut() {
            let before = list.len();
            list.retain(|h| h.strong_count() > 0);
            pruned += before - list.len();
        }

        if pruned > 0 {
            tracing::debug!(pruned, "Pruned dropped handlers from registry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{CancelCallback, HandlerError};
    use crate::models::{MessageFlags, Payload};

    struct Named(&'static str);

    impl Handler for Named {
        fn show_message(
            &self,
            _message: &str,
            _flags: MessageFlags,
            _payload: &Payload,
        ) -> Result<(), HandlerError> {
            Ok(())
        }

        fn show_dialog(&self, _input: Payload) -> Result<Payload, HandlerError> {
            Ok(Payload::from(self.0))
        }

        fn category_mask(&self) -> Category {
            Category::empty()
        }

        fn set_category_mask(&self, _mask: Category) {}

        fn set_cancel_callback(&self, _callback: CancelCallback) {}
    }

    fn named(name: &'static str) -> Arc<dyn Handler> {
        Arc::new(Named(name))
    }

    fn names(list: &[Weak<dyn Handler>]) -> Vec<String> {
        list.iter()
            .filter_map(Weak::upgrade)
            .map(|h| h.show_dialog(Payload::Empty).unwrap().as_text().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_lookup_unknown_category_is_empty() {
        let registry = CategoryRegistry::new();
        assert!(registry.lookup(Category::NETWORK).is_empty());
        assert!(registry.first_live(Category::NETWORK).is_none());
        assert_eq!(registry.handler_count(Category::NETWORK), 0);
    }

    #[test]
    fn test_lookup_preserves_registration_order() {
        let mut registry = CategoryRegistry::new();
        let (a, b, c) = (named("a"), named("b"), named("c"));
        registry.register(Category::SCRIPT, &b);
        registry.register(Category::SCRIPT, &a);
        registry.register(Category::SCRIPT, &c);

        assert_eq!(names(&registry.lookup(Category::SCRIPT)), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_duplicate_registration_is_kept() {
        let mut registry = CategoryRegistry::new();
        let a = named("a");
        registry.register(Category::ERROR, &a);
        registry.register(Category::ERROR, &a);

        assert_eq!(registry.handler_count(Category::ERROR), 2);
    }

    #[test]
    fn test_exact_mask_keys() {
        let mut registry = CategoryRegistry::new();
        let a = named("a");
        registry.register(Category::SCRIPT | Category::NETWORK, &a);

        assert_eq!(registry.handler_count(Category::SCRIPT), 0);
        assert_eq!(registry.handler_count(Category::SCRIPT | Category::NETWORK), 1);
        assert_eq!(
            registry.categories(),
            vec![Category::SCRIPT | Category::NETWORK]
        );
    }

    #[test]
    fn test_dropped_handler_is_skipped_and_pruned() {
        let mut registry = CategoryRegistry::new();
        let a = named("a");
        let b = named("b");
        registry.register(Category::LIBRARY, &a);
        registry.register(Category::LIBRARY, &b);

        drop(a);
        assert_eq!(registry.handler_count(Category::LIBRARY), 1);
        assert_eq!(names(&registry.lookup(Category::LIBRARY)), vec!["b"]);

        let first = registry.first_live(Category::LIBRARY).unwrap().upgrade().unwrap();
        assert_eq!(first.show_dialog(Payload::Empty).unwrap(), Payload::from("b"));

        let c = named("c");
        registry.register(Category::GLOBAL, &c);
        assert_eq!(registry.lookup(Category::LIBRARY).len(), 1);
    }
}
