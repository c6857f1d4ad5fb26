pub mod prelude;

pub mod attendance_records;
pub mod employees;
pub mod settings;
