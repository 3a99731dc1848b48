// Arena-indexed decay tree of the central system
//
// The topology is built once and never mutates. Per-trial quantities
// (offshell masses, four-momenta) live in a separate DecayState owned by
// the event, so one tree can be shared by every worker.

use crate::error::{KinematicsError, Result};
use crate::four_vector::FourMomentum;
use crate::mass::OffshellMassSampler;
use crate::particle::ParticleInfo;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecayNode {
    pub particle: ParticleInfo,
    #[serde(default)]
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecayTree {
    nodes: Vec<DecayNode>,
    roots: Vec<NodeId>,
}

impl DecayTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree with the given first-level particles and no further decays.
    pub fn from_stable(particles: Vec<ParticleInfo>) -> Self {
        let mut tree = DecayTree::new();
        for p in particles {
            tree.add_root(p);
        }
        tree
    }

    /// Build from raw parts, e.g. after deserialization, and validate.
    pub fn from_parts(nodes: Vec<DecayNode>, roots: Vec<NodeId>) -> Result<Self> {
        let tree = DecayTree { nodes, roots };
        tree.validate()?;
        Ok(tree)
    }

    /// Append a first-level central particle.
    pub fn add_root(&mut self, particle: ParticleInfo) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(DecayNode {
            particle,
            children: Vec::new(),
        });
        self.roots.push(id);
        id
    }

    /// Append a decay product of `parent`.
    pub fn add_child(&mut self, parent: NodeId, particle: ParticleInfo) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(DecayNode {
            particle,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &DecayNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of first-level central particles.
    pub fn multiplicity(&self) -> usize {
        self.roots.len()
    }

    /// Identical-particle factor Π n_i! over the first-level products,
    /// grouped by PDG id.
    pub fn symmetry_factor(&self) -> f64 {
        let mut counts: BTreeMap<i32, u32> = BTreeMap::new();
        for &r in &self.roots {
            *counts.entry(self.nodes[r].particle.pdg).or_insert(0) += 1;
        }
        counts
            .values()
            .map(|&n| (1..=n).map(f64::from).product::<f64>())
            .product()
    }

    /// Final-state (leaf) nodes in depth-first order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for &r in &self.roots {
            self.collect_leaves(r, &mut out);
        }
        out
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let node = &self.nodes[id];
        if node.children.is_empty() {
            out.push(id);
        } else {
            for &c in &node.children {
                self.collect_leaves(c, out);
            }
        }
    }

    /// Every index in range, every node reached exactly once from the
    /// roots (no sharing, no cycles), decaying nodes have >= 2 products.
    pub fn validate(&self) -> Result<()> {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack: Vec<NodeId> = self.roots.clone();
        while let Some(id) = stack.pop() {
            if id >= self.nodes.len() {
                return Err(KinematicsError::InvalidDecayTree(format!(
                    "node index {} out of range ({} nodes)",
                    id,
                    self.nodes.len()
                )));
            }
            if seen[id] {
                return Err(KinematicsError::InvalidDecayTree(format!(
                    "node {} reached twice",
                    id
                )));
            }
            seen[id] = true;
            let node = &self.nodes[id];
            if node.children.len() == 1 {
                return Err(KinematicsError::InvalidDecayTree(format!(
                    "{} decays into a single particle",
                    node.particle.name
                )));
            }
            stack.extend(node.children.iter().copied());
        }
        if let Some(orphan) = seen.iter().position(|s| !s) {
            return Err(KinematicsError::InvalidDecayTree(format!(
                "node {} ({}) is not reachable from the roots",
                orphan, self.nodes[orphan].particle.name
            )));
        }
        Ok(())
    }

    pub fn new_state(&self) -> DecayState {
        DecayState {
            offshell: self.nodes.iter().map(|n| n.particle.mass).collect(),
            p4: vec![FourMomentum::ZERO; self.nodes.len()],
        }
    }

    /// Resample the offshell mass of every node. A decaying node is always
    /// kept above the sum of its (freshly sampled) daughter masses.
    pub fn resample_masses(
        &self,
        state: &mut DecayState,
        sampler: &dyn OffshellMassSampler,
        max_trials: usize,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        for &r in &self.roots {
            self.resample_node(r, state, sampler, max_trials, rng)?;
        }
        Ok(())
    }

    fn resample_node(
        &self,
        id: NodeId,
        state: &mut DecayState,
        sampler: &dyn OffshellMassSampler,
        max_trials: usize,
        rng: &mut dyn RngCore,
    ) -> Result<f64> {
        let node = &self.nodes[id];
        for _ in 0..max_trials {
            let mut threshold = 0.0;
            for &c in &node.children {
                threshold += self.resample_node(c, state, sampler, max_trials, rng)?;
            }
            if let Some(m) = sampler.propose(&node.particle, threshold, f64::INFINITY, rng) {
                if node.children.is_empty() || m > threshold {
                    state.offshell[id] = m;
                    return Ok(m);
                }
            }
        }
        Err(KinematicsError::IterationExhausted {
            context: format!("offshell mass of {}", node.particle.name),
            trials: max_trials,
        })
    }
}

/// Per-trial masses and momenta of every tree node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecayState {
    pub offshell: Vec<f64>,
    pub p4: Vec<FourMomentum>,
}
