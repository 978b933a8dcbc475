//! Parent/child traversal shared by the asset and location trees.
//!
//! Cycles are rejected at write time by [`ensure_no_cycle`]; the read-side
//! walks still carry a visited set so a corrupted row cannot hang a request.

use async_trait::async_trait;
use std::collections::HashSet;
use tracing::warn;

use crate::database::manager::DatabaseError;
use crate::database::models::{Asset, Location};
use crate::database::repository::AssetRepository;
use crate::services::error::{ServiceError, ServiceResult};

/// A row that points at its parent by id
pub trait TreeNode: Send + Sync {
    const ENTITY: &'static str;

    fn node_id(&self) -> i32;
    fn parent(&self) -> Option<i32>;
}

impl TreeNode for Asset {
    const ENTITY: &'static str = "Asset";

    fn node_id(&self) -> i32 {
        self.id
    }

    fn parent(&self) -> Option<i32> {
        self.parent_id
    }
}

impl TreeNode for Location {
    const ENTITY: &'static str = "Location";

    fn node_id(&self) -> i32 {
        self.id
    }

    fn parent(&self) -> Option<i32> {
        self.parent_id
    }
}

/// Node lookup for one tree
#[async_trait]
pub trait TreeSource<N: TreeNode>: Send + Sync {
    async fn node(&self, id: i32) -> Result<Option<N>, DatabaseError>;
    async fn children(&self, id: i32) -> Result<Vec<N>, DatabaseError>;
}

/// The asset tree of a repository
pub struct AssetTree<'a, R: ?Sized>(pub &'a R);

/// The location tree of a repository
pub struct LocationTree<'a, R: ?Sized>(pub &'a R);

#[async_trait]
impl<R: AssetRepository + ?Sized> TreeSource<Asset> for AssetTree<'_, R> {
    async fn node(&self, id: i32) -> Result<Option<Asset>, DatabaseError> {
        self.0.asset_by_id(id).await
    }

    async fn children(&self, id: i32) -> Result<Vec<Asset>, DatabaseError> {
        self.0.asset_children(id).await
    }
}

#[async_trait]
impl<R: AssetRepository + ?Sized> TreeSource<Location> for LocationTree<'_, R> {
    async fn node(&self, id: i32) -> Result<Option<Location>, DatabaseError> {
        self.0.location_by_id(id).await
    }

    async fn children(&self, id: i32) -> Result<Vec<Location>, DatabaseError> {
        self.0.location_children(id).await
    }
}

/// Parent chain of `start`, nearest first. Stops at a root, at a dangling
/// parent reference, or at the first repeated id.
pub async fn ancestors<N, S>(source: &S, start: &N) -> Result<Vec<N>, DatabaseError>
where
    N: TreeNode,
    S: TreeSource<N> + ?Sized,
{
    let mut chain = Vec::new();
    let mut seen = HashSet::from([start.node_id()]);
    let mut next = start.parent();

    while let Some(id) = next {
        if !seen.insert(id) {
            warn!("{} {} has a cyclic parent chain at {}", N::ENTITY, start.node_id(), id);
            break;
        }
        match source.node(id).await? {
            Some(node) => {
                next = node.parent();
                chain.push(node);
            }
            None => break,
        }
    }

    Ok(chain)
}

/// `root` followed by every descendant, pre-order, each node once
pub async fn descendants<N, S>(source: &S, root: N) -> Result<Vec<N>, DatabaseError>
where
    N: TreeNode,
    S: TreeSource<N> + ?Sized,
{
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        let id = node.node_id();
        if !seen.insert(id) {
            continue;
        }
        let children = source.children(id).await?;
        out.push(node);
        // Reverse so the lowest-id child is visited first
        stack.extend(children.into_iter().rev());
    }

    Ok(out)
}

/// Reject making `candidate_parent` the parent of `node_id` when that would
/// close a loop. A missing candidate is reported as not found.
pub async fn ensure_no_cycle<N, S>(source: &S, node_id: i32, candidate_parent: i32) -> ServiceResult<()>
where
    N: TreeNode,
    S: TreeSource<N> + ?Sized,
{
    if candidate_parent == node_id {
        return Err(ServiceError::conflict(format!("{} {} cannot be its own parent", N::ENTITY, node_id)));
    }

    let parent = source
        .node(candidate_parent)
        .await?
        .ok_or_else(|| ServiceError::not_found(N::ENTITY, candidate_parent))?;

    if ancestors(source, &parent).await?.iter().any(|a| a.node_id() == node_id) {
        warn!("Rejected parent {} for {} {}: would create a cycle", candidate_parent, N::ENTITY, node_id);
        return Err(ServiceError::conflict(format!(
            "Setting parent {} would make {} {} its own ancestor",
            candidate_parent,
            N::ENTITY,
            node_id
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq)]
    struct Node {
        id: i32,
        parent: Option<i32>,
    }

    impl TreeNode for Node {
        const ENTITY: &'static str = "Node";

        fn node_id(&self) -> i32 {
            self.id
        }

        fn parent(&self) -> Option<i32> {
            self.parent
        }
    }

    struct Nodes(HashMap<i32, Node>);

    impl Nodes {
        fn new(edges: &[(i32, Option<i32>)]) -> Self {
            Self(edges.iter().map(|&(id, parent)| (id, Node { id, parent })).collect())
        }
    }

    #[async_trait]
    impl TreeSource<Node> for Nodes {
        async fn node(&self, id: i32) -> Result<Option<Node>, DatabaseError> {
            Ok(self.0.get(&id).cloned())
        }

        async fn children(&self, id: i32) -> Result<Vec<Node>, DatabaseError> {
            let mut kids: Vec<Node> = self.0.values().filter(|n| n.parent == Some(id)).cloned().collect();
            kids.sort_by_key(|n| n.id);
            Ok(kids)
        }
    }

    fn ids(nodes: &[Node]) -> Vec<i32> {
        nodes.iter().map(|n| n.id).collect()
    }

    #[tokio::test]
    async fn ancestors_are_nearest_first() {
        let tree = Nodes::new(&[(1, None), (2, Some(1)), (3, Some(2))]);
        let leaf = tree.0[&3].clone();
        assert_eq!(ids(&ancestors(&tree, &leaf).await.unwrap()), vec![2, 1]);

        let root = tree.0[&1].clone();
        assert!(ancestors(&tree, &root).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ancestor_walk_terminates_on_corrupt_cycle() {
        let tree = Nodes::new(&[(1, Some(3)), (2, Some(1)), (3, Some(2))]);
        let start = tree.0[&3].clone();
        assert_eq!(ids(&ancestors(&tree, &start).await.unwrap()), vec![2, 1]);
    }

    #[tokio::test]
    async fn descendants_are_preorder_and_include_root() {
        // 1 -> (2 -> (4, 5), 3 -> 6)
        let tree = Nodes::new(&[(1, None), (2, Some(1)), (3, Some(1)), (4, Some(2)), (5, Some(2)), (6, Some(3))]);
        let root = tree.0[&1].clone();
        assert_eq!(ids(&descendants(&tree, root).await.unwrap()), vec![1, 2, 4, 5, 3, 6]);

        let leaf = tree.0[&6].clone();
        assert_eq!(ids(&descendants(&tree, leaf).await.unwrap()), vec![6]);
    }

    #[tokio::test]
    async fn cycle_guard_rejects_self_and_descendants() {
        let tree = Nodes::new(&[(1, None), (2, Some(1)), (3, Some(2)), (4, None)]);

        assert!(matches!(ensure_no_cycle::<Node, _>(&tree, 1, 1).await, Err(ServiceError::Conflict(_))));
        assert!(matches!(ensure_no_cycle::<Node, _>(&tree, 1, 3).await, Err(ServiceError::Conflict(_))));
        assert!(matches!(ensure_no_cycle::<Node, _>(&tree, 1, 99).await, Err(ServiceError::NotFound { .. })));
        assert!(ensure_no_cycle::<Node, _>(&tree, 3, 4).await.is_ok());
        assert!(ensure_no_cycle::<Node, _>(&tree, 4, 3).await.is_ok());
    }
}
