pub mod faculty;
pub mod students;
