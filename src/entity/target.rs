use super::Entity;
use crate::error::Error;
use crate::error::Result;

/// Shape of a scan destination
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// A single entity, filled in place
    Struct,
    /// A growable sequence of entities, replaced on scan
    Sequence,
    /// A fixed-size slice; readable, never a scan destination
    Slice,
}

/// Something rows can be scanned into, or records read from
///
/// Implemented for every derived entity, `Vec<E>` (including `Vec<Box<E>>`)
/// and `[E]`.
pub trait ScanTarget: Send + Sync {
    type Entity: Entity;

    fn shape(&self) -> Shape;

    /// Records held by the destination, in order
    fn records(&self) -> Vec<&Self::Entity>;

    /// The single entity of a struct destination
    fn entity_mut(&mut self) -> Option<&mut Self::Entity> {
        None
    }

    /// Replace the contents of a sequence destination
    fn replace_all(&mut self, _rows: Vec<Self::Entity>) -> Result<()> {
        Err(Error::ScannerUnsupportedShape)
    }
}

impl<E: Entity> ScanTarget for Vec<E> {
    type Entity = E;

    fn shape(&self) -> Shape {
        Shape::Sequence
    }

    fn records(&self) -> Vec<&E> {
        self.iter().collect()
    }

    fn replace_all(&mut self, rows: Vec<E>) -> Result<()> {
        *self = rows;
        Ok(())
    }
}

impl<E: Entity> ScanTarget for [E] {
    type Entity = E;

    fn shape(&self) -> Shape {
        Shape::Slice
    }

    fn records(&self) -> Vec<&E> {
        self.iter().collect()
    }
}
