pub mod caller;
pub mod component;
pub mod course;
pub mod mark_record;
pub mod student;

pub use caller::{Caller, Role};
pub use component::{Component, Credit, InvalidCredit};
pub use course::Course;
pub use mark_record::{MarkKey, MarkRecord, VerificationStatus};
pub use student::Student;
