//! Generation - procedural creation of starting terrain

mod terrain;

pub use terrain::*;
