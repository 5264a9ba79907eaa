//! The per-phase tick systems, in pipeline order.
//!
//! Each phase is a free function over the grid. Decision passes read the
//! pre-phase board and may run in parallel; apply passes are sequential
//! so conflicting writes serialize.

pub mod aging;
pub mod movement;
pub mod predation;
pub mod reproduction;
