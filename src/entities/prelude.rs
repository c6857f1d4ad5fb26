pub use super::attendance_records::Entity as AttendanceRecords;
pub use super::employees::Entity as Employees;
pub use super::settings::Entity as Settings;
