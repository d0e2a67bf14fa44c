// Dendrogram: labelled linkage steps plus the queries renderers need.
//
// Leaves are 0..n, merge k creates cluster n + k, so the root of a complete
// tree is 2n − 2.

use serde::Serialize;

use super::linkage::LinkageStep;

/// A complete (or partial) average-linkage tree over labelled leaves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dendrogram {
    labels: Vec<String>,
    steps: Vec<LinkageStep>,
}

impl Dendrogram {
    pub fn new(labels: Vec<String>, steps: Vec<LinkageStep>) -> Self {
        Self { labels, steps }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn steps(&self) -> &[LinkageStep] {
        &self.steps
    }

    /// Number of original items.
    pub fn n_items(&self) -> usize {
        self.labels.len()
    }

    /// Id of the root cluster, if the tree is complete.
    pub fn root(&self) -> Option<usize> {
        let n = self.n_items();
        (n >= 2 && self.steps.len() == n - 1).then(|| 2 * n - 2)
    }

    /// The step that created `cluster`, if it is not a leaf.
    fn step_for(&self, cluster: usize) -> Option<&LinkageStep> {
        cluster
            .checked_sub(self.n_items())
            .and_then(|k| self.steps.get(k))
    }

    /// Merge height of `cluster`; 0 for leaves.
    pub fn height(&self, cluster: usize) -> f64 {
        self.step_for(cluster).map_or(0.0, |s| s.distance)
    }

    /// Leaf indices under `cluster`, left to right.
    pub fn members(&self, cluster: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![cluster];
        while let Some(c) = stack.pop() {
            match self.step_for(c) {
                Some(step) => {
                    stack.push(step.cluster_b);
                    stack.push(step.cluster_a);
                }
                None if c < self.n_items() => out.push(c),
                None => {}
            }
        }
        out
    }

    /// Left-to-right leaf order of the full tree, as a renderer draws it.
    pub fn leaf_order(&self) -> Vec<usize> {
        match self.root() {
            Some(root) => self.members(root),
            None => (0..self.n_items()).collect(),
        }
    }

    /// Flat cluster assignment using only the first `n_merges` steps.
    /// Cluster numbers are consecutive in order of first appearance.
    fn assign(&self, n_merges: usize) -> Vec<usize> {
        let n = self.n_items();
        let mut owner: Vec<usize> = (0..n).collect();
        for (k, step) in self.steps.iter().take(n_merges).enumerate() {
            let new_id = n + k;
            let leaves = self
                .members(step.cluster_a)
                .into_iter()
                .chain(self.members(step.cluster_b));
            for leaf in leaves {
                owner[leaf] = new_id;
            }
        }

        let mut seen: Vec<usize> = Vec::new();
        owner
            .into_iter()
            .map(|id| match seen.iter().position(|&s| s == id) {
                Some(pos) => pos,
                None => {
                    seen.push(id);
                    seen.len() - 1
                }
            })
            .collect()
    }

    /// Flat assignment into `k` clusters (clamped to `1..=n`).
    pub fn cut_to_k(&self, k: usize) -> Vec<usize> {
        let n = self.n_items();
        let k = k.clamp(1, n.max(1));
        self.assign(n - k)
    }

    /// Flat assignment keeping every merge at or below `threshold`.
    pub fn cut_at_distance(&self, threshold: f64) -> Vec<usize> {
        let merges = self
            .steps
            .iter()
            .take_while(|s| s.distance <= threshold)
            .count();
        self.assign(merges)
    }

    /// Newick serialization with branch lengths (parent height minus child
    /// height), for external tree viewers.
    pub fn to_newick(&self) -> String {
        match self.root() {
            Some(root) => format!("{};", self.newick_node(root)),
            None => format!(
                "({});",
                self.labels.iter().map(|l| newick_label(l)).collect::<Vec<_>>().join(",")
            ),
        }
    }

    fn newick_node(&self, cluster: usize) -> String {
        match self.step_for(cluster) {
            Some(step) => {
                let h = step.distance;
                format!(
                    "({}:{:.6},{}:{:.6})",
                    self.newick_node(step.cluster_a),
                    h - self.height(step.cluster_a),
                    self.newick_node(step.cluster_b),
                    h - self.height(step.cluster_b),
                )
            }
            None => newick_label(&self.labels[cluster]),
        }
    }
}

fn newick_label(label: &str) -> String {
    if label.chars().any(|c| "()[]':;, \t".contains(c)) {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}
