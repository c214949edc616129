pub mod marks;
pub mod result;
pub mod roster;
