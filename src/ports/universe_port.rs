//! Symbol list access port trait.

use crate::domain::error::ProfitHighError;
use crate::domain::universe::UniverseEntry;

pub trait UniversePort {
    fn load_entries(&self) -> Result<Vec<UniverseEntry>, ProfitHighError>;
}
