// Hierarchical clustering: average linkage and the dendrogram it produces.

pub mod dendrogram;
pub mod linkage;

pub use dendrogram::Dendrogram;
pub use linkage::{HierarchicalClusterer, LinkageStep};
