//! `SeaORM` implementation of the `AttendanceService` trait.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{Local, Timelike};
use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::face::{FaceApiError, FaceGeometry, FaceMatcher};
use crate::clients::mailer::Notifier;
use crate::config::AttendanceConfig;
use crate::db::{AttendanceRecord, DateFilter, Employee, InsertOutcome, Store};
use crate::services::attendance::{
    AbsenceOutcome, AttendanceError, AttendancePercentage, AttendanceService, RosterEntry,
    VerifyOutcome,
};
use crate::services::lateness;
use crate::services::verification::{self, Decision, VerifyPolicy};

pub struct SeaOrmAttendanceService {
    store: Store,
    geometry: Arc<dyn FaceGeometry>,
    matcher: Arc<dyn FaceMatcher>,
    notifier: Arc<dyn Notifier>,
    config: AttendanceConfig,
}

impl SeaOrmAttendanceService {
    #[must_use]
    pub fn new(
        store: Store,
        geometry: Arc<dyn FaceGeometry>,
        matcher: Arc<dyn FaceMatcher>,
        notifier: Arc<dyn Notifier>,
        config: AttendanceConfig,
    ) -> Self {
        Self {
            store,
            geometry,
            matcher,
            notifier,
            config,
        }
    }

    async fn require_employee(&self, employee_id: &str) -> Result<Employee, AttendanceError> {
        self.store
            .get_employee(employee_id)
            .await?
            .ok_or_else(|| {
                AttendanceError::NotFound(format!("No employee found with ID {employee_id}"))
            })
    }

    /// Runs the liveness gate: a face must be present and the eye centers
    /// must be far enough apart.
    async fn check_liveness(&self, captured: &[u8]) -> Result<(), AttendanceError> {
        let eyes = self
            .geometry
            .locate_eyes(captured)
            .await
            .map_err(map_face_error)?
            .ok_or(AttendanceError::LivenessRejected)?;

        if eyes.separation() < self.config.min_eye_distance {
            return Err(AttendanceError::LivenessRejected);
        }
        Ok(())
    }

    /// Comparison + decision + idempotent ledger write shared by both
    /// check-in paths.
    async fn match_and_record(
        &self,
        employee: &Employee,
        captured: &[u8],
        in_time: &str,
        policy: &VerifyPolicy,
    ) -> Result<VerifyOutcome, AttendanceError> {
        let reference = BASE64.decode(&employee.face_image).map_err(|e| {
            AttendanceError::Internal(format!("Stored reference image is not valid base64: {e}"))
        })?;

        let result = self
            .matcher
            .compare(captured, &reference, policy.enforce_detection)
            .await
            .map_err(map_face_error)?;

        let similarity = match verification::decide(result, policy) {
            Decision::Rejected { similarity } => return Ok(VerifyOutcome::Rejected { similarity }),
            Decision::Accepted { similarity } => similarity,
        };

        let parsed_in_time = lateness::parse_in_time(in_time)
            .map_err(|e| AttendanceError::Validation(e.to_string()))?;
        let threshold_str = self
            .store
            .get_in_time_threshold(&self.config.default_in_time)
            .await?;
        let threshold = lateness::parse_threshold(&threshold_str)
            .map_err(|e| AttendanceError::Internal(format!("Stored threshold invalid: {e}")))?;
        let late_time = lateness::compute_late_time(parsed_in_time, threshold);

        let today = Local::now().format("%Y-%m-%d").to_string();

        let outcome = self
            .store
            .insert_attendance_if_absent(
                &employee.employee_id,
                &today,
                in_time,
                "present",
                late_time.clone(),
            )
            .await?;

        match outcome {
            InsertOutcome::Inserted(record) => {
                self.notify_recorded(employee, &record).await;
                info!(
                    "Attendance recorded for {} on {} at {}",
                    employee.employee_id, record.date, record.in_time
                );
                Ok(VerifyOutcome::Recorded {
                    date: record.date,
                    in_time: record.in_time,
                    late_time: record.late_time,
                    similarity,
                })
            }
            InsertOutcome::AlreadyExists(record) => Ok(VerifyOutcome::AlreadyMarked {
                in_time: record.in_time,
            }),
        }
    }

    /// Best effort; a dead mailer never fails a recorded check-in.
    async fn notify_recorded(&self, employee: &Employee, record: &AttendanceRecord) {
        let mut body = format!(
            "Your attendance has been recorded on {} at {}.",
            record.date, record.in_time
        );
        if let Some(late) = &record.late_time {
            body.push_str(&format!(" You were {late} late."));
        }

        if let Err(e) = self
            .notifier
            .send(
                &employee.email,
                "Attendance Recorded - Face Recognition System",
                &body,
            )
            .await
        {
            warn!(
                "Attendance notification to {} failed: {e}",
                employee.email
            );
        }
    }
}

fn map_face_error(err: FaceApiError) -> AttendanceError {
    match err {
        FaceApiError::DetectionFailed => AttendanceError::NoFaceDetected,
        FaceApiError::Http(e) | FaceApiError::InvalidResponse(e) => AttendanceError::External(e),
    }
}

#[async_trait]
impl AttendanceService for SeaOrmAttendanceService {
    async fn verify_and_record(
        &self,
        employee_id: &str,
        captured: &[u8],
        in_time: &str,
    ) -> Result<VerifyOutcome, AttendanceError> {
        self.check_liveness(captured).await?;

        let employee = self.require_employee(employee_id).await?;

        self.match_and_record(&employee, captured, in_time, &verification::PRIMARY)
            .await
    }

    async fn verify_fallback(
        &self,
        employee_id: &str,
        password: &str,
        captured: &[u8],
        in_time: Option<&str>,
    ) -> Result<VerifyOutcome, AttendanceError> {
        let employee = self.require_employee(employee_id).await?;

        // The password is advisory on this path: a mismatch is logged but
        // the stored reference image is used regardless.
        let password_ok = self
            .store
            .verify_employee_password(employee_id, password)
            .await?;
        if !password_ok {
            warn!("Fallback check-in for {employee_id} with non-matching password");
        }

        let now;
        let in_time = match in_time {
            Some(t) => t,
            None => {
                now = Local::now().format("%H:%M:%S").to_string();
                &now
            }
        };

        self.match_and_record(&employee, captured, in_time, &verification::FALLBACK)
            .await
    }

    async fn mark_absent(&self, employee_id: &str) -> Result<AbsenceOutcome, AttendanceError> {
        self.require_employee(employee_id).await?;

        let now = Local::now();
        let today = now.format("%Y-%m-%d").to_string();

        if self
            .store
            .get_attendance_for_date(employee_id, &today)
            .await?
            .is_some()
        {
            return Ok(AbsenceOutcome::AlreadyMarked);
        }

        if now.hour() < self.config.absence_cutoff_hour {
            return Ok(AbsenceOutcome::TooEarly);
        }

        let outcome = self
            .store
            .insert_attendance_if_absent(employee_id, &today, "Absent", "absent", None)
            .await?;

        match outcome {
            InsertOutcome::Inserted(_) => {
                info!("Employee {employee_id} marked absent for {today}");
                Ok(AbsenceOutcome::Marked { date: today })
            }
            InsertOutcome::AlreadyExists(_) => Ok(AbsenceOutcome::AlreadyMarked),
        }
    }

    async fn records(
        &self,
        employee_id: &str,
        filter: &DateFilter,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        Ok(self.store.query_attendance(employee_id, filter).await?)
    }

    async fn history(&self, employee_id: &str) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        self.require_employee(employee_id).await?;

        Ok(self
            .store
            .query_attendance(employee_id, &DateFilter::default())
            .await?)
    }

    async fn roster(&self, filter: &DateFilter) -> Result<Vec<RosterEntry>, AttendanceError> {
        let filter = if filter.date.is_none() && filter.month.is_none() {
            DateFilter {
                date: Some(Local::now().format("%Y-%m-%d").to_string()),
                month: None,
            }
        } else {
            filter.clone()
        };

        // Reported for employees with no record under the filter.
        let filter_date = filter.date.clone().or_else(|| filter.month.clone());

        let employees = self.store.list_employees().await?;
        let mut entries = Vec::with_capacity(employees.len());

        for employee in employees {
            let record = self
                .store
                .find_attendance_first(&employee.employee_id, &filter)
                .await?;

            let entry = match record {
                Some(record) => RosterEntry {
                    employee_id: employee.employee_id,
                    employee_name: employee.employee_name,
                    department: employee.department,
                    email: employee.email,
                    status: record.status,
                    in_time: Some(record.in_time),
                    late_time: record.late_time,
                    date: Some(record.date),
                },
                None => RosterEntry {
                    employee_id: employee.employee_id,
                    employee_name: employee.employee_name,
                    department: employee.department,
                    email: employee.email,
                    status: "not_marked".to_string(),
                    in_time: None,
                    late_time: None,
                    date: filter_date.clone(),
                },
            };
            entries.push(entry);
        }

        Ok(entries)
    }

    async fn percentage(
        &self,
        employee_id: &str,
    ) -> Result<AttendancePercentage, AttendanceError> {
        let total_days = self.store.distinct_attendance_dates().await?.len();
        let present_days = self.store.distinct_present_dates(employee_id).await?.len();

        #[allow(clippy::cast_precision_loss)]
        let percentage = if total_days == 0 {
            0.0
        } else {
            present_days as f64 / total_days as f64 * 100.0
        };

        Ok(AttendancePercentage {
            present_days,
            total_days,
            percentage,
        })
    }
}
