#[path = "property/cardinality.rs"]
mod cardinality;

#[path = "property/hashing.rs"]
mod hashing;
