//! Bottom-up traversal of bundle structures and key trees.
//!
//! Children are visited before their container: entries before their bundle,
//! bundles before their group, child items before their parent item, and every
//! item before the tree itself.

use crate::{
    bundle::Bundle,
    group::BundleGroup,
    tree::{KeyTree, KeyTreeItem},
    types::BundleEntry,
};

/// A node of the bundle structure.
#[derive(Debug, Clone, Copy)]
pub enum BundleNode<'a> {
    Group(&'a BundleGroup),
    Bundle(&'a Bundle),
    Entry(&'a BundleEntry),
}

/// A node of a key tree.
#[derive(Debug, Clone, Copy)]
pub enum TreeNode<'a> {
    Tree(&'a KeyTree),
    Item(&'a KeyTreeItem),
}

pub fn walk_group<'a>(group: &'a BundleGroup, visit: &mut impl FnMut(BundleNode<'a>)) {
    for bundle in group.bundles() {
        walk_bundle(bundle, visit);
    }
    visit(BundleNode::Group(group));
}

/// Visits entries in the bundle's presentation order, then the bundle.
pub fn walk_bundle<'a>(bundle: &'a Bundle, visit: &mut impl FnMut(BundleNode<'a>)) {
    for entry in bundle.entries() {
        visit(BundleNode::Entry(entry));
    }
    visit(BundleNode::Bundle(bundle));
}

pub fn walk_tree<'a>(tree: &'a KeyTree, visit: &mut impl FnMut(TreeNode<'a>)) {
    for root in tree.root_items() {
        walk_item(tree, root, visit);
    }
    visit(TreeNode::Tree(tree));
}

/// Visits the subtree below `item` depth first, then `item`.
pub fn walk_item<'a>(tree: &'a KeyTree, item: &'a KeyTreeItem, visit: &mut impl FnMut(TreeNode<'a>)) {
    for child in tree.children(item.id()) {
        walk_item(tree, child, visit);
    }
    visit(TreeNode::Item(item));
}
