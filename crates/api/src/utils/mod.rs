//! Helpers shared by the composition root.

pub mod logging;
