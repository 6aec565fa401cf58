pub mod engine;
pub mod policy;
pub mod ranking;
pub mod symbols;
pub mod trie;
pub mod types;
