//! Grid storage: arbitrary-bound arrays and the data built on them.

pub mod arena;
pub mod bounds;
pub mod receivers;
pub mod seismogram;
pub mod wavefield;
