pub mod detail_cache;
pub mod directory;
pub mod providers;
pub mod score_index;
pub mod social_graph;
pub mod stats;
pub mod weights;

pub use social_graph::SocialGraph;
