//! ContainerResolver port - block/container lookup in the live world.

use crate::domain::{Container, Coordinate};

/// Looks up the container at a coordinate.
pub trait ContainerResolver: Send + Sync {
    /// `None` when nothing is there, or the block cannot hold items.
    fn resolve(&self, coordinate: &Coordinate) -> Option<Container>;
}
