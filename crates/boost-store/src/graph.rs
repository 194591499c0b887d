//! Resource graph
//!
//! Boost nodes live in an arena indexed by URI. Each slot keeps a parent
//! index and a child list, so ancestor walks and cycle checks are index
//! chasing with no allocation. The graph is a forest: every node has at most
//! one parent and no node is its own ancestor.

use boost_core::{BoostError, BoostResult, BoostUri, PermissionSet, ProfileId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Credential template carried by a boost
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoostPayload {
    /// Display name
    pub name: Option<String>,
    /// Category label, e.g. "Badge" or "ID"
    pub category: Option<String>,
    /// Template body copied into issued credentials
    pub credential: serde_json::Value,
}

/// A boost node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boost {
    /// Unique URI
    pub uri: BoostUri,
    /// Parent boost; maintained by the graph
    parent_uri: Option<BoostUri>,
    /// Creating profile
    pub creator: ProfileId,
    /// Policy granting capabilities to any authenticated actor
    pub default_permissions: Option<PermissionSet>,
    /// Role granted on this boost to whoever claims a credential issued under it
    pub claim_permissions: Option<PermissionSet>,
    /// Credential template
    pub payload: BoostPayload,
    /// Creation time
    pub created_at_ms: u64,
    /// Last edit time
    pub updated_at_ms: u64,
}

impl Boost {
    /// New detached boost
    pub fn new(uri: BoostUri, creator: ProfileId, payload: BoostPayload, now_ms: u64) -> Self {
        Self {
            uri,
            parent_uri: None,
            creator,
            default_permissions: None,
            claim_permissions: None,
            payload,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    /// Attach to `parent` on insertion
    pub fn with_parent(mut self, parent: BoostUri) -> Self {
        self.parent_uri = Some(parent);
        self
    }

    /// Set the default policy
    pub fn with_default_permissions(mut self, permissions: Option<PermissionSet>) -> Self {
        self.default_permissions = permissions;
        self
    }

    /// Set the claim role
    pub fn with_claim_permissions(mut self, permissions: Option<PermissionSet>) -> Self {
        self.claim_permissions = permissions;
        self
    }

    /// Parent boost, if any
    pub fn parent_uri(&self) -> Option<&BoostUri> {
        self.parent_uri.as_ref()
    }
}

#[derive(Debug, Clone)]
struct Slot {
    boost: Boost,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Arena of boost nodes
#[derive(Debug, Clone, Default)]
pub struct BoostGraph {
    slots: Vec<Slot>,
    index: HashMap<BoostUri, usize>,
}

impl BoostGraph {
    /// Empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of boosts
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the graph holds no boosts
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether `uri` names a boost
    pub fn contains(&self, uri: &BoostUri) -> bool {
        self.index.contains_key(uri)
    }

    /// Look up a boost
    pub fn get(&self, uri: &BoostUri) -> Option<&Boost> {
        self.index.get(uri).map(|&i| &self.slots[i].boost)
    }

    /// Look up a boost or fail with `NotFound`
    pub fn require(&self, uri: &BoostUri) -> BoostResult<&Boost> {
        self.get(uri)
            .ok_or_else(|| BoostError::not_found(format!("Boost not found: {uri}")))
    }

    /// Mutable access for payload and policy edits.
    ///
    /// Parent links cannot be changed through this handle; use
    /// [`BoostGraph::set_parent`].
    pub fn get_mut(&mut self, uri: &BoostUri) -> Option<&mut Boost> {
        let i = *self.index.get(uri)?;
        Some(&mut self.slots[i].boost)
    }

    /// Insert a boost, linking it under its parent
    pub fn insert(&mut self, boost: Boost) -> BoostResult<()> {
        if self.contains(&boost.uri) {
            return Err(BoostError::conflict(format!(
                "Boost already exists: {}",
                boost.uri
            )));
        }
        let parent = match boost.parent_uri() {
            Some(parent_uri) => Some(self.slot_of(parent_uri)?),
            None => None,
        };

        let i = self.slots.len();
        self.index.insert(boost.uri.clone(), i);
        self.slots.push(Slot {
            boost,
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            self.slots[p].children.push(i);
        }
        Ok(())
    }

    /// Make `parent` the parent of `child`.
    ///
    /// Fails with `BadRequest` when this would create a cycle and `Conflict`
    /// when `child` already has a parent.
    pub fn set_parent(&mut self, child: &BoostUri, parent: &BoostUri) -> BoostResult<()> {
        let c = self.slot_of(child)?;
        let p = self.slot_of(parent)?;
        if c == p || self.ancestor_slots(p).any(|a| a == c) {
            return Err(BoostError::bad_request(format!(
                "{child} cannot become a descendant of itself"
            )));
        }
        if self.slots[c].parent.is_some() {
            return Err(BoostError::conflict(format!("{child} already has a parent")));
        }

        self.slots[c].parent = Some(p);
        self.slots[c].boost.parent_uri = Some(parent.clone());
        self.slots[p].children.push(c);
        Ok(())
    }

    /// Detach `child` from its parent. Returns the former parent.
    pub fn remove_parent(&mut self, child: &BoostUri) -> BoostResult<Option<BoostUri>> {
        let c = self.slot_of(child)?;
        let Some(p) = self.slots[c].parent.take() else {
            return Ok(None);
        };
        self.slots[p].children.retain(|&i| i != c);
        Ok(self.slots[c].boost.parent_uri.take())
    }

    /// Parent of `uri`
    pub fn parent(&self, uri: &BoostUri) -> Option<&Boost> {
        let i = *self.index.get(uri)?;
        self.slots[i].parent.map(|p| &self.slots[p].boost)
    }

    /// Ancestors of `uri`, parent first, ending at the root
    pub fn ancestors(&self, uri: &BoostUri) -> Ancestors<'_> {
        let next = self.index.get(uri).and_then(|&i| self.slots[i].parent);
        Ancestors { graph: self, next }
    }

    /// Whether `ancestor` lies strictly above `uri`
    pub fn is_ancestor(&self, ancestor: &BoostUri, uri: &BoostUri) -> bool {
        self.ancestors(uri).any(|boost| &boost.uri == ancestor)
    }

    /// Ancestors up to `generations` levels up
    pub fn parents(&self, uri: &BoostUri, generations: u32) -> Vec<&Boost> {
        self.ancestors(uri).take(generations as usize).collect()
    }

    /// Descendants up to `generations` levels down, breadth first
    pub fn children(&self, uri: &BoostUri, generations: u32) -> Vec<&Boost> {
        let Some(&start) = self.index.get(uri) else {
            return Vec::new();
        };
        let mut found = Vec::new();
        let mut queue: VecDeque<(usize, u32)> = VecDeque::from([(start, 0)]);
        while let Some((i, depth)) = queue.pop_front() {
            if depth >= generations {
                continue;
            }
            for &child in &self.slots[i].children {
                found.push(&self.slots[child].boost);
                queue.push_back((child, depth + 1));
            }
        }
        found
    }

    /// Every descendant at any depth
    pub fn descendants(&self, uri: &BoostUri) -> Vec<&Boost> {
        self.children(uri, u32::MAX)
    }

    /// Other children of `uri`'s parent
    pub fn siblings(&self, uri: &BoostUri) -> Vec<&Boost> {
        let Some(&i) = self.index.get(uri) else {
            return Vec::new();
        };
        let Some(p) = self.slots[i].parent else {
            return Vec::new();
        };
        self.slots[p]
            .children
            .iter()
            .filter(|&&c| c != i)
            .map(|&c| &self.slots[c].boost)
            .collect()
    }

    /// Ancestors, descendants and siblings of `uri`, each once, excluding `uri`
    pub fn familial(
        &self,
        uri: &BoostUri,
        parent_generations: u32,
        child_generations: u32,
    ) -> Vec<&Boost> {
        let mut seen: HashSet<&BoostUri> = HashSet::from([uri]);
        self.parents(uri, parent_generations)
            .into_iter()
            .chain(self.children(uri, child_generations))
            .chain(self.siblings(uri))
            .filter(|boost| seen.insert(&boost.uri))
            .collect()
    }

    /// Every boost in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Boost> {
        self.slots.iter().map(|slot| &slot.boost)
    }

    fn slot_of(&self, uri: &BoostUri) -> BoostResult<usize> {
        self.index
            .get(uri)
            .copied()
            .ok_or_else(|| BoostError::not_found(format!("Boost not found: {uri}")))
    }

    fn ancestor_slots(&self, start: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.slots[start].parent, |&i| self.slots[i].parent)
    }
}

/// Iterator over a boost's ancestors, nearest first
pub struct Ancestors<'a> {
    graph: &'a BoostGraph,
    next: Option<usize>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Boost;

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.next?;
        let slot = &self.graph.slots[i];
        self.next = slot.parent;
        Some(&slot.boost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(id: &str) -> BoostUri {
        BoostUri::new("example.org", id)
    }

    fn node(id: &str, parent: Option<&str>) -> Boost {
        let boost = Boost::new(uri(id), ProfileId::new("admin"), BoostPayload::default(), 0);
        match parent {
            Some(p) => boost.with_parent(uri(p)),
            None => boost,
        }
    }

    /// network -> troop -> scout, network -> other
    fn scouts() -> BoostGraph {
        let mut graph = BoostGraph::new();
        graph.insert(node("network", None)).unwrap();
        graph.insert(node("troop", Some("network"))).unwrap();
        graph.insert(node("scout", Some("troop"))).unwrap();
        graph.insert(node("other", Some("network"))).unwrap();
        graph
    }

    fn ids(boosts: Vec<&Boost>) -> Vec<String> {
        boosts.into_iter().map(|b| b.uri.id().to_string()).collect()
    }

    #[test]
    fn ancestors_walk_to_root() {
        let graph = scouts();
        let walked: Vec<_> = graph.ancestors(&uri("scout")).map(|b| b.uri.id()).collect();
        assert_eq!(walked, vec!["troop", "network"]);
        assert!(graph.is_ancestor(&uri("network"), &uri("scout")));
        assert!(!graph.is_ancestor(&uri("scout"), &uri("network")));
    }

    #[test]
    fn insert_requires_existing_parent() {
        let mut graph = scouts();
        let err = graph.insert(node("orphan", Some("missing"))).unwrap_err();
        assert!(err.is_not_found());
        let dup = graph.insert(node("troop", None)).unwrap_err();
        assert!(matches!(dup, BoostError::Conflict { .. }));
    }

    #[test]
    fn generations_limit_queries() {
        let graph = scouts();
        assert_eq!(ids(graph.children(&uri("network"), 1)), vec!["troop", "other"]);
        assert_eq!(
            ids(graph.children(&uri("network"), 2)),
            vec!["troop", "other", "scout"]
        );
        assert_eq!(ids(graph.parents(&uri("scout"), 1)), vec!["troop"]);
        assert_eq!(ids(graph.siblings(&uri("troop"))), vec!["other"]);
        assert!(graph.siblings(&uri("network")).is_empty());
    }

    #[test]
    fn familial_excludes_self_and_duplicates() {
        let graph = scouts();
        let family = ids(graph.familial(&uri("troop"), 1, 1));
        assert_eq!(family, vec!["network", "scout", "other"]);
    }

    #[test]
    fn reparenting_rejects_cycles_and_second_parents() {
        let mut graph = scouts();
        let cycle = graph.set_parent(&uri("network"), &uri("scout")).unwrap_err();
        assert!(matches!(cycle, BoostError::BadRequest { .. }));
        let own = graph.set_parent(&uri("troop"), &uri("troop")).unwrap_err();
        assert!(matches!(own, BoostError::BadRequest { .. }));
        let twice = graph.set_parent(&uri("scout"), &uri("other")).unwrap_err();
        assert!(matches!(twice, BoostError::Conflict { .. }));
    }

    #[test]
    fn detach_then_reattach() {
        let mut graph = scouts();
        let former = graph.remove_parent(&uri("scout")).unwrap();
        assert_eq!(former, Some(uri("troop")));
        assert!(graph.children(&uri("troop"), 1).is_empty());
        assert!(graph.get(&uri("scout")).unwrap().parent_uri().is_none());

        graph.set_parent(&uri("scout"), &uri("other")).unwrap();
        assert_eq!(
            graph.parent(&uri("scout")).map(|b| b.uri.clone()),
            Some(uri("other"))
        );
    }
}
