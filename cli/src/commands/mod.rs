pub mod collect;
pub mod dataset;
pub mod nodes;
