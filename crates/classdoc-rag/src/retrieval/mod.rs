//! Retrieval and answer generation over stored chunks

mod search;

pub use search::QueryEngine;
