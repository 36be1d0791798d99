//! Anchor bookkeeping for one serializer session.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::{Error, Instance, Object};

/// Bidirectional map between object identity and anchor labels.
///
/// The write side hands out `o0`, `o1`, ... in first-encounter order. The
/// read side maps labels found in the document to the objects built for them.
#[derive(Clone, Default)]
pub struct AnchorTable {
    // identity -> label; the instance keeps the address from being reused
    labels: HashMap<usize, (String, Instance)>,
    objects: HashMap<String, Object>,
    next: usize,
}

impl AnchorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label of `instance`, allocating one on first encounter. The flag is
    /// `true` when the label was just allocated.
    pub fn get_or_create_label(&mut self, instance: &Instance) -> (String, bool) {
        if let Some((label, _)) = self.labels.get(&instance.id()) {
            return (label.clone(), false);
        }
        let label = format!("o{}", self.next);
        self.next += 1;
        trace!(%label, ?instance, "new anchor");
        self.labels
            .insert(instance.id(), (label.clone(), instance.clone()));
        (label, true)
    }

    /// Label previously given to `instance`, if any.
    pub fn label_of(&self, instance: &Instance) -> Option<&str> {
        self.labels.get(&instance.id()).map(|(label, _)| label.as_str())
    }

    /// Records the object built for `label`. A later registration of the
    /// same label replaces the earlier one.
    pub fn register(&mut self, label: &str, object: Object) {
        trace!(%label, ?object, "anchor registered");
        self.objects.insert(label.to_owned(), object);
    }

    /// The object registered under `label`.
    pub fn resolve(&self, label: &str) -> Result<Object, Error> {
        self.objects
            .get(label)
            .cloned()
            .ok_or_else(|| Error::AnchorNotFound {
                anchor: label.to_owned(),
            })
    }

    /// Forgets the labels read so far; written labels are kept.
    pub fn clear_read(&mut self) {
        self.objects.clear();
    }

    /// Forgets every label, both directions, and restarts numbering.
    pub fn clear(&mut self) {
        self.labels.clear();
        self.objects.clear();
        self.next = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.objects.is_empty()
    }
}

impl fmt::Debug for AnchorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnchorTable")
            .field("written", &self.labels.len())
            .field("read", &self.objects.len())
            .field("next", &self.next)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Reflect, shared};

    #[test]
    fn labels_are_allocated_once_per_identity() {
        let mut table = AnchorTable::new();
        let a = shared(vec![1]).to_object();
        let b = shared(vec![1]).to_object();
        let a = a.as_instance().unwrap();
        let b = b.as_instance().unwrap();

        assert_eq!(table.get_or_create_label(a), ("o0".to_owned(), true));
        assert_eq!(table.get_or_create_label(b), ("o1".to_owned(), true));
        assert_eq!(table.get_or_create_label(a), ("o0".to_owned(), false));
        assert_eq!(table.label_of(b), Some("o1"));
    }

    #[test]
    fn unknown_labels_fail_to_resolve() {
        let mut table = AnchorTable::new();
        table.register("o3", Object::Null);
        assert!(table.resolve("o3").unwrap().is_null());
        assert!(matches!(
            table.resolve("o4"),
            Err(Error::AnchorNotFound { anchor }) if anchor == "o4"
        ));

        let written = shared(vec![2]).to_object();
        table.get_or_create_label(written.as_instance().unwrap());
        table.clear_read();
        assert!(table.resolve("o3").is_err());
        assert!(!table.is_empty());

        table.clear();
        assert!(table.is_empty());
        assert!(table.resolve("o3").is_err());
    }
}
