//! Algorithms over the grid storage: sampling, collection, model set-up,
//! and the communication layer they run on.

pub mod collection;
pub mod communicator;
pub mod model;
pub mod recording;
pub mod sampling;
pub mod wire;

pub use collection::collect;
pub use sampling::signed_sqrt;
