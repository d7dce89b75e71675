//! Domain decomposition of the structured global grid.

pub mod partition;
