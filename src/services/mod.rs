pub mod lateness;

pub mod otp;
pub use otp::{OtpError, OtpKind, OtpVault, RegistrationPayload};

pub mod verification;
pub use verification::{Decision, VerifyPolicy};

pub mod enrollment;
pub mod enrollment_impl;
pub use enrollment::{EnrollmentError, EnrollmentService, ProfileUpdate, RegistrationRequest};
pub use enrollment_impl::SeaOrmEnrollmentService;

pub mod attendance;
pub mod attendance_impl;
pub use attendance::{
    AbsenceOutcome, AttendanceError, AttendancePercentage, AttendanceService, RosterEntry,
    VerifyOutcome,
};
pub use attendance_impl::SeaOrmAttendanceService;
