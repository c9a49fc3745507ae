//! Built-in similarity strategies

mod jaccard;
mod tfidf;

pub use jaccard::WeightedJaccard;
pub use tfidf::TfIdfCosine;
