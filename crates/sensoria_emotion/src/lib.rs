pub mod engine;
pub mod mapping;

pub use engine::{collapse_label, EmotionEngine};
pub use mapping::{MappingTables, ModalityBundle, MIN_INTENSITY_FACTOR};
