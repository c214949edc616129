pub mod aggregation;
pub mod components;
pub mod marks;
pub mod verification;

pub use marks::MarkPolicy;
