use std::ops::{Index, IndexMut};

use slotmap::SlotMap;
use tracing::warn;

/// Arena-backed n-ary forest with an observer notified of structural changes.
pub struct Tree<O> {
    pub map: NodeMap,
    pub data: O,
}

impl<O: Observer> Tree<O> {
    pub fn with_observer(data: O) -> Self { Tree { map: NodeMap::new(), data } }

    /// Allocates a parentless node.
    pub fn mk_node(&mut self) -> UnattachedNode<'_, O> {
        let id = self.map.map.insert(Links::default());
        UnattachedNode { id, tree: self }
    }
}

/// Structure of every tree in the forest.
///
/// All workspaces share one map so that subtrees can move between them
/// without reallocating ids.
pub struct NodeMap {
    map: SlotMap<NodeId, Links>,
}

impl NodeMap {
    fn new() -> NodeMap { NodeMap { map: SlotMap::default() } }

    pub fn contains(&self, id: NodeId) -> bool { self.map.contains_key(id) }

    pub fn len(&self) -> usize { self.map.len() }

    pub fn is_empty(&self) -> bool { self.map.is_empty() }

    /// Exchanges the child lists of `a` and `b` without firing observer events.
    pub fn swap_children(&mut self, a: NodeId, b: NodeId) {
        if a == b || !self.contains(a) || !self.contains(b) {
            return;
        }
        let a_children: Vec<_> = a.children(self).collect();
        let b_children: Vec<_> = b.children(self).collect();
        let (a_first, a_last) = (self[a].first_child, self[a].last_child);
        let (b_first, b_last) = (self[b].first_child, self[b].last_child);
        self[a].first_child = b_first;
        self[a].last_child = b_last;
        self[b].first_child = a_first;
        self[b].last_child = a_last;
        for child in a_children {
            self[child].parent = Some(b);
        }
        for child in b_children {
            self[child].parent = Some(a);
        }
    }

    fn link(&mut self, id: NodeId, parent: NodeId, prev: Option<NodeId>, next: Option<NodeId>) {
        let links = &mut self[id];
        links.parent = Some(parent);
        links.prev_sibling = prev;
        links.next_sibling = next;
        match prev {
            Some(prev) => self[prev].next_sibling = Some(id),
            None => self[parent].first_child = Some(id),
        }
        match next {
            Some(next) => self[next].prev_sibling = Some(id),
            None => self[parent].last_child = Some(id),
        }
    }

    fn unlink(&mut self, id: NodeId) {
        let Some(links) = self.map.get(id) else { return };
        let (parent, prev, next) = (links.parent, links.prev_sibling, links.next_sibling);
        if let Some(prev) = prev {
            self[prev].next_sibling = next;
        }
        if let Some(next) = next {
            self[next].prev_sibling = prev;
        }
        if let Some(parent) = parent {
            let parent = &mut self[parent];
            if parent.first_child == Some(id) {
                parent.first_child = next;
            }
            if parent.last_child == Some(id) {
                parent.last_child = prev;
            }
        }
        let links = &mut self[id];
        links.parent = None;
        links.prev_sibling = None;
        links.next_sibling = None;
    }

    /// Whether linking `id` under `parent` would make a cycle.
    fn would_cycle(&self, id: NodeId, parent: NodeId) -> bool {
        parent.ancestors(self).any(|ancestor| ancestor == id)
    }
}

impl Index<NodeId> for NodeMap {
    type Output = Links;

    fn index(&self, index: NodeId) -> &Self::Output { &self.map[index] }
}

impl IndexMut<NodeId> for NodeMap {
    fn index_mut(&mut self, index: NodeId) -> &mut Self::Output { &mut self.map[index] }
}

/// Ownership of a root node.
///
/// Roots must be removed through [`OwnedNode::remove`] or handed back with
/// [`OwnedNode::release`]; dropping one otherwise panics in debug builds.
#[must_use]
#[derive(Debug)]
pub struct OwnedNode(Option<NodeId>, &'static str);

impl OwnedNode {
    pub fn own(node: NodeId, name: &'static str) -> Self { OwnedNode(Some(node), name) }

    pub fn id(&self) -> Option<NodeId> { self.0 }

    #[track_caller]
    pub fn remove(mut self, tree: &mut Tree<impl Observer>) {
        if let Some(id) = self.0.take() {
            id.detach(tree).remove();
        }
    }

    /// Gives up ownership without deleting the node.
    pub fn release(mut self) -> Option<NodeId> { self.0.take() }
}

impl Drop for OwnedNode {
    fn drop(&mut self) {
        if cfg!(debug_assertions) {
            if let Some(node) = self.0 {
                panic!(
                    "OwnedNode {name:?} dropped without being removed or released: {node:?}",
                    name = self.1,
                );
            }
        }
    }
}

slotmap::new_key_type! {
    /// A node somewhere in the forest.
    pub struct NodeId;
}

impl NodeId {
    pub fn detach<'a, O: Observer>(self, tree: &'a mut Tree<O>) -> DetachedNode<'a, O> {
        DetachedNode { id: self, tree }
    }

    pub fn parent(self, map: &NodeMap) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.parent)
    }

    pub fn children(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        let mut cur = map.map.get(self).and_then(|n| n.first_child);
        std::iter::from_fn(move || {
            let id = cur?;
            cur = map.map.get(id).and_then(|n| n.next_sibling);
            Some(id)
        })
    }

    pub fn child_count(self, map: &NodeMap) -> usize { self.children(map).count() }

    /// This node followed by each of its ancestors up to the root.
    pub fn ancestors(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = map.contains(self).then_some(self);
        std::iter::from_fn(move || {
            let node = next?;
            next = node.parent(map);
            Some(node)
        })
    }

    pub fn traverse_preorder(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        PreorderTraversal {
            top: self,
            cur: map.contains(self).then_some(self),
            map,
        }
    }

    pub fn next_sibling(self, map: &NodeMap) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.next_sibling)
    }

    pub fn prev_sibling(self, map: &NodeMap) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.prev_sibling)
    }

    pub fn first_child(self, map: &NodeMap) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.first_child)
    }

    pub fn last_child(self, map: &NodeMap) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.last_child)
    }

    pub fn is_empty(self, map: &NodeMap) -> bool { self.first_child(map).is_none() }
}

/// Receives structural events from a [`Tree`].
pub trait Observer
where Self: Sized {
    fn added_to_parent(&mut self, map: &NodeMap, node: NodeId);
    fn removing_from_parent(&mut self, map: &NodeMap, node: NodeId);
    /// Called once for every node of a deleted subtree, before its links are dropped.
    fn removed_from_forest(&mut self, map: &NodeMap, node: NodeId);
}

impl Observer for () {
    fn added_to_parent(&mut self, _map: &NodeMap, _node: NodeId) {}

    fn removing_from_parent(&mut self, _map: &NodeMap, _node: NodeId) {}

    fn removed_from_forest(&mut self, _map: &NodeMap, _node: NodeId) {}
}

#[must_use = "Unattached nodes should be inserted into the tree or kept as a root"]
pub struct UnattachedNode<'a, O> {
    id: NodeId,
    tree: &'a mut Tree<O>,
}

impl<'a, O: Observer> UnattachedNode<'a, O> {
    /// Leaves the node parentless in the forest.
    pub fn into_id(self) -> NodeId { self.id }

    pub fn push_back(self, parent: NodeId) -> NodeId { self.id.detach(self.tree).push_back(parent) }

    pub fn insert_after(self, sibling: NodeId) -> NodeId {
        self.id.detach(self.tree).insert_after(sibling)
    }
}

/// A node about to be moved or removed.
#[must_use = "Detached nodes should be reattached to the tree or removed"]
pub struct DetachedNode<'a, O> {
    id: NodeId,
    tree: &'a mut Tree<O>,
}

impl<'a, O: Observer> DetachedNode<'a, O> {
    pub fn push_back(self, parent: NodeId) -> NodeId {
        self.attach(parent, |map| (parent.last_child(map), None))
    }

    pub fn push_front(self, parent: NodeId) -> NodeId {
        self.attach(parent, |map| (None, parent.first_child(map)))
    }

    pub fn insert_before(self, sibling: NodeId) -> NodeId {
        let Some(parent) = self.sibling_parent(sibling) else { return self.id };
        self.attach(parent, |map| (sibling.prev_sibling(map), Some(sibling)))
    }

    pub fn insert_after(self, sibling: NodeId) -> NodeId {
        let Some(parent) = self.sibling_parent(sibling) else { return self.id };
        self.attach(parent, |map| (Some(sibling), sibling.next_sibling(map)))
    }

    /// Unlinks the node from its parent and leaves it in the forest as a root.
    pub fn orphan(self) -> NodeId {
        if self.id.parent(&self.tree.map).is_some() {
            self.tree.data.removing_from_parent(&self.tree.map, self.id);
            self.tree.map.unlink(self.id);
        }
        self.id
    }

    /// Unlinks the node and deletes it together with its subtree.
    pub fn remove(self) {
        let DetachedNode { id, tree } = self;
        let id = DetachedNode { id, tree: &mut *tree }.orphan();
        let doomed: Vec<_> = id.traverse_preorder(&tree.map).collect();
        for &node in &doomed {
            tree.data.removed_from_forest(&tree.map, node);
        }
        for node in doomed {
            tree.map.map.remove(node);
        }
    }

    fn sibling_parent(&self, sibling: NodeId) -> Option<NodeId> {
        if sibling == self.id {
            return None;
        }
        let parent = sibling.parent(&self.tree.map);
        if parent.is_none() {
            warn!("cannot make {:?} a sibling of root node {sibling:?}", self.id);
        }
        parent
    }

    /// Unlinks the node, then links it under `parent` between the two
    /// siblings returned by `place`, which sees the map after unlinking.
    fn attach(
        self,
        parent: NodeId,
        place: impl FnOnce(&NodeMap) -> (Option<NodeId>, Option<NodeId>),
    ) -> NodeId {
        let DetachedNode { id, tree } = self;
        if !tree.map.contains(id) || !tree.map.contains(parent) || tree.map.would_cycle(id, parent)
        {
            warn!("refusing to link node {id:?} under {parent:?}");
            return id;
        }
        let old_parent = id.parent(&tree.map);
        if old_parent.is_some() && old_parent != Some(parent) {
            tree.data.removing_from_parent(&tree.map, id);
        }
        tree.map.unlink(id);
        let (prev, next) = place(&tree.map);
        tree.map.link(id, parent, prev, next);
        if old_parent != Some(parent) {
            tree.data.added_to_parent(&tree.map, id);
        }
        id
    }
}

/// Sibling and child links of one node.
#[derive(Default, PartialEq, Debug)]
pub struct Links {
    parent: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
}

struct PreorderTraversal<'a> {
    top: NodeId,
    cur: Option<NodeId>,
    map: &'a NodeMap,
}

impl<'a> Iterator for PreorderTraversal<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cur?;
        let (top, map) = (self.top, self.map);
        self.cur = node.first_child(map).or_else(|| {
            node.ancestors(map)
                .take_while(|&ancestor| ancestor != top)
                .find_map(|ancestor| ancestor.next_sibling(map))
        });
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// ```text
    ///         [tree]             [spare]
    ///        __root__             spare
    ///       /    |   \
    ///  left   middle  right
    ///            |
    ///          inner
    /// ```
    struct TestTree {
        tree: Tree<Events>,
        root_node: Option<OwnedNode>,
        root: NodeId,
        left: NodeId,
        middle: NodeId,
        right: NodeId,
        inner: NodeId,
        spare_node: Option<OwnedNode>,
        spare: NodeId,
    }

    impl Drop for TestTree {
        fn drop(&mut self) {
            if let Some(root) = self.root_node.take() {
                root.remove(&mut self.tree);
            }
            if let Some(spare) = self.spare_node.take() {
                spare.remove(&mut self.tree);
            }
        }
    }

    impl TestTree {
        fn new() -> Self {
            let mut tree = Tree::with_observer(Events(vec![]));
            let root = tree.mk_node().into_id();
            let left = tree.mk_node().push_back(root);
            let middle = tree.mk_node().push_back(root);
            let right = tree.mk_node().push_back(root);
            let inner = tree.mk_node().push_back(middle);
            let spare = tree.mk_node().into_id();
            tree.data.0.clear();
            TestTree {
                tree,
                root_node: Some(OwnedNode::own(root, "tree")),
                root,
                left,
                middle,
                right,
                inner,
                spare_node: Some(OwnedNode::own(spare, "spare")),
                spare,
            }
        }

        #[track_caller]
        fn assert_children_are(&self, expected: &[NodeId], parent: NodeId) {
            let map = &self.tree.map;
            assert_eq!(expected, parent.children(map).collect::<Vec<_>>(), "children");
            for &child in expected {
                assert_eq!(Some(parent), child.parent(map), "child has incorrect parent");
            }
        }

        fn take_events(&mut self) -> Vec<TreeEvent> { self.tree.data.0.drain(..).collect() }
    }

    #[derive(Clone, PartialEq, Debug)]
    enum TreeEvent {
        AddedToParent(NodeId),
        RemovingFromParent(NodeId, NodeId),
        RemovedFromForest(NodeId),
    }
    use TreeEvent::*;

    struct Events(Vec<TreeEvent>);

    impl Observer for Events {
        fn added_to_parent(&mut self, _map: &NodeMap, node: NodeId) {
            self.0.push(AddedToParent(node))
        }

        fn removing_from_parent(&mut self, map: &NodeMap, node: NodeId) {
            let parent = node.parent(map).expect("removing a node without parent");
            self.0.push(RemovingFromParent(node, parent))
        }

        fn removed_from_forest(&mut self, _map: &NodeMap, node: NodeId) {
            self.0.push(RemovedFromForest(node))
        }
    }

    #[test]
    fn children_in_both_directions() {
        let t = TestTree::new();
        t.assert_children_are(&[t.left, t.middle, t.right], t.root);
        t.assert_children_are(&[t.inner], t.middle);
        t.assert_children_are(&[], t.spare);
        assert_eq!(3, t.root.child_count(&t.tree.map));
    }

    #[test]
    fn ancestors_start_at_self() {
        let t = TestTree::new();
        let ancestors = |node: NodeId| node.ancestors(&t.tree.map).collect::<Vec<_>>();
        assert_eq!(vec![t.inner, t.middle, t.root], ancestors(t.inner));
        assert_eq!(vec![t.spare], ancestors(t.spare));
    }

    #[test]
    fn preorder_stays_inside_subtree() {
        let t = TestTree::new();
        let traverse = |node: NodeId| node.traverse_preorder(&t.tree.map).collect::<Vec<_>>();
        assert_eq!(vec![t.root, t.left, t.middle, t.inner, t.right], traverse(t.root));
        assert_eq!(vec![t.middle, t.inner], traverse(t.middle));
        assert_eq!(vec![t.left], traverse(t.left));
    }

    #[test]
    fn insert_positions() {
        let mut t = TestTree::new();
        let front = t.tree.mk_node().into_id();
        front.detach(&mut t.tree).push_front(t.root);
        let before_right = t.tree.mk_node().into_id();
        before_right.detach(&mut t.tree).insert_before(t.right);
        let after_left = t.tree.mk_node().insert_after(t.left);
        t.assert_children_are(
            &[front, t.left, after_left, t.middle, before_right, t.right],
            t.root,
        );
        assert_eq!(
            vec![AddedToParent(front), AddedToParent(before_right), AddedToParent(after_left)],
            t.take_events()
        );
    }

    #[test]
    fn reorder_within_parent_fires_no_events() {
        let mut t = TestTree::new();
        t.left.detach(&mut t.tree).push_back(t.root);
        t.assert_children_are(&[t.middle, t.right, t.left], t.root);
        t.left.detach(&mut t.tree).insert_after(t.middle);
        t.assert_children_are(&[t.middle, t.left, t.right], t.root);
        t.middle.detach(&mut t.tree).push_back(t.root);
        t.assert_children_are(&[t.left, t.right, t.middle], t.root);
        assert_eq!(Vec::<TreeEvent>::new(), t.take_events());
    }

    #[test]
    fn move_between_parents() {
        let mut t = TestTree::new();
        t.left.detach(&mut t.tree).push_back(t.spare);
        t.assert_children_are(&[t.middle, t.right], t.root);
        t.assert_children_are(&[t.left], t.spare);
        assert_eq!(
            vec![RemovingFromParent(t.left, t.root), AddedToParent(t.left)],
            t.take_events()
        );
    }

    #[test]
    fn remove_deletes_subtree() {
        let mut t = TestTree::new();
        t.middle.detach(&mut t.tree).remove();
        t.assert_children_are(&[t.left, t.right], t.root);
        assert!(!t.tree.map.contains(t.inner));
        assert_eq!(
            vec![
                RemovingFromParent(t.middle, t.root),
                RemovedFromForest(t.middle),
                RemovedFromForest(t.inner),
            ],
            t.take_events()
        );
    }

    #[test]
    fn orphan_keeps_node_alive() {
        let mut t = TestTree::new();
        let id = t.right.detach(&mut t.tree).orphan();
        assert_eq!(None, id.parent(&t.tree.map));
        assert!(t.tree.map.contains(id));
        t.assert_children_are(&[t.left, t.middle], t.root);
        id.detach(&mut t.tree).remove();
    }

    #[test]
    fn swap_children_moves_lists() {
        let mut t = TestTree::new();
        t.tree.map.swap_children(t.root, t.spare);
        t.assert_children_are(&[], t.root);
        t.assert_children_are(&[t.left, t.middle, t.right], t.spare);
        t.tree.map.swap_children(t.spare, t.root);
        t.tree.map.swap_children(t.middle, t.left);
        t.assert_children_are(&[t.inner], t.left);
        assert!(t.middle.is_empty(&t.tree.map));
        assert_eq!(Vec::<TreeEvent>::new(), t.take_events());
    }

    #[test]
    fn self_link_prevention() {
        let mut t = TestTree::new();
        t.middle.detach(&mut t.tree).push_back(t.inner);
        t.root.detach(&mut t.tree).push_back(t.root);
        t.left.detach(&mut t.tree).insert_after(t.left);
        t.assert_children_are(&[t.left, t.middle, t.right], t.root);
        t.assert_children_are(&[t.inner], t.middle);
    }

    #[test]
    fn siblings_and_ends() {
        let t = TestTree::new();
        let map = &t.tree.map;
        assert_eq!(Some(t.middle), t.left.next_sibling(map));
        assert_eq!(None, t.left.prev_sibling(map));
        assert_eq!(Some(t.left), t.root.first_child(map));
        assert_eq!(Some(t.right), t.root.last_child(map));
        assert!(t.right.is_empty(map));
    }

    #[test]
    fn released_root_survives() {
        let mut t = TestTree::new();
        let id = t.spare_node.take().and_then(OwnedNode::release);
        assert_eq!(Some(t.spare), id);
        assert!(t.tree.map.contains(t.spare));
        t.spare.detach(&mut t.tree).remove();
        assert!(!t.tree.map.contains(t.spare));
    }
}
