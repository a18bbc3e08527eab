use std::collections::BTreeSet;

use serde::Serialize;

/// Where a [`KeyTreeItem`] hangs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ItemParent {
    Root,
    Item(String),
}

/// A node of a [`super::KeyTree`].
///
/// In a flat tree every item is a key. In a grouped tree an item may also be a
/// group node whose id is a key prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyTreeItem {
    id: String,
    name: String,
    parent: ItemParent,
    children: BTreeSet<String>,
    visible: bool,
}

impl KeyTreeItem {
    pub(crate) fn new(id: impl Into<String>, name: impl Into<String>, parent: ItemParent) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent,
            children: BTreeSet::new(),
            visible: true,
        }
    }

    /// Full path, which is also the key when the item stands for one.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> &ItemParent {
        &self.parent
    }

    pub fn parent_id(&self) -> Option<&str> {
        match &self.parent {
            ItemParent::Root => None,
            ItemParent::Item(id) => Some(id),
        }
    }

    /// Child ids in lexicographic order.
    pub fn children(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(String::as_str)
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Whether the item matches the current filter.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn add_child(&mut self, id: &str) {
        self.children.insert(id.to_string());
    }

    pub(crate) fn remove_child(&mut self, id: &str) -> bool {
        self.children.remove(id)
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}
