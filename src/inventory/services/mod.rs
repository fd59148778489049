/// Domain services - pure operations over the domain models
pub mod component_merger;

pub use component_merger::ComponentMerger;
