pub mod gene;
pub mod strand;
pub mod transposon;

// re-export for cleaner imports
pub use self::gene::{GeneData, GeneDatum};
pub use self::strand::Strand;
pub use self::transposon::{TransposonData, TransposonRecord};
