use crate::*;
pub use random::*;

mod random;

pub trait BoardGenerator {
    fn generate(self, config: BoardConfig, catalog: &HazardCatalog) -> Result<Board>;
}
