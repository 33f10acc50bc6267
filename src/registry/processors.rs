//! Processor factory: prototypes keyed by class name.

use crate::core::error::RegistryError;
use crate::core::processor::{Category, Processor, ProcessorMetadata};
use indexmap::IndexMap;

/// Registry entry holding the prototype and its cached metadata.
struct ProcessorEntry {
    prototype: Box<dyn Processor>,
    metadata: ProcessorMetadata,
}

/// Registry for all available processor classes.
///
/// Instances are built through the prototype's `create()`. Classes keep
/// their registration order.
#[derive(Default)]
pub struct ProcessorFactory {
    entries: IndexMap<String, ProcessorEntry>,
    /// Class names grouped by category.
    categories: IndexMap<Category, Vec<String>>,
}

impl ProcessorFactory {
    /// Create a new empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor class. Fails if the class name is taken.
    pub fn register(&mut self, prototype: Box<dyn Processor>) -> Result<(), RegistryError> {
        let metadata = prototype.metadata();
        let class = metadata.class_name.clone();
        if self.entries.contains_key(&class) {
            return Err(RegistryError::DuplicateClass(class));
        }

        self.categories
            .entry(metadata.category)
            .or_default()
            .push(class.clone());
        log::debug!("Registered processor class '{}'", class);
        self.entries.insert(class, ProcessorEntry { prototype, metadata });
        Ok(())
    }

    /// Create a new instance of a class.
    pub fn create(&self, class: &str) -> Result<Box<dyn Processor>, RegistryError> {
        self.entries
            .get(class)
            .map(|e| e.prototype.create())
            .ok_or_else(|| RegistryError::UnknownClass(class.to_string()))
    }

    /// Get metadata without creating an instance.
    pub fn metadata(&self, class: &str) -> Option<&ProcessorMetadata> {
        self.entries.get(class).map(|e| &e.metadata)
    }

    pub fn contains(&self, class: &str) -> bool {
        self.entries.contains_key(class)
    }

    /// All registered class names in registration order.
    pub fn known_classes(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Class names of one category.
    pub fn by_category(&self, category: Category) -> Vec<&str> {
        self.categories
            .get(&category)
            .map(|names| names.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Metadata grouped by category, each group sorted by class name.
    pub fn grouped_by_category(&self) -> IndexMap<Category, Vec<&ProcessorMetadata>> {
        let mut grouped: IndexMap<Category, Vec<&ProcessorMetadata>> = IndexMap::new();
        for category in Category::all() {
            let mut members: Vec<&ProcessorMetadata> = self
                .by_category(*category)
                .into_iter()
                .filter_map(|name| self.metadata(name))
                .collect();
            if members.is_empty() {
                continue;
            }
            members.sort_by(|a, b| a.class_name.cmp(&b.class_name));
            grouped.insert(*category, members);
        }
        grouped
    }

    /// Search classes by name, description or tag.
    pub fn search(&self, query: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, e)| e.metadata.matches(query))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Remove a class. Returns false if it was not registered.
    pub fn unregister(&mut self, class: &str) -> bool {
        match self.entries.shift_remove(class) {
            Some(entry) => {
                if let Some(names) = self.categories.get_mut(&entry.metadata.category) {
                    names.retain(|n| n != class);
                }
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move every class of `other` into this factory.
    pub(crate) fn absorb(&mut self, other: ProcessorFactory) -> Result<(), RegistryError> {
        for (_, entry) in other.entries {
            self.register(entry.prototype)?;
        }
        Ok(())
    }
}
