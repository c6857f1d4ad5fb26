use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::attendance::{AttendanceRecord, DateFilter, InsertOutcome};
pub use repositories::employee::{Employee, EmployeeUpdate, NewEmployee};

/// Key under which the in-time threshold lives in the settings table.
pub const IN_TIME_THRESHOLD_KEY: &str = "in_time_threshold";

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn employee_repo(&self) -> repositories::employee::EmployeeRepository {
        repositories::employee::EmployeeRepository::new(self.conn.clone())
    }

    fn attendance_repo(&self) -> repositories::attendance::AttendanceRepository {
        repositories::attendance::AttendanceRepository::new(self.conn.clone())
    }

    fn settings_repo(&self) -> repositories::settings::SettingsRepository {
        repositories::settings::SettingsRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Employees
    // ========================================================================

    pub async fn get_employee(&self, employee_id: &str) -> Result<Option<Employee>> {
        self.employee_repo().get_by_employee_id(employee_id).await
    }

    pub async fn get_employee_by_email(&self, email: &str) -> Result<Option<Employee>> {
        self.employee_repo().get_by_email(email).await
    }

    pub async fn get_employee_by_id_and_email(
        &self,
        employee_id: &str,
        email: &str,
    ) -> Result<Option<Employee>> {
        self.employee_repo()
            .get_by_id_and_email(employee_id, email)
            .await
    }

    pub async fn list_employees(&self) -> Result<Vec<Employee>> {
        self.employee_repo().list_all().await
    }

    pub async fn insert_employee(&self, new: NewEmployee) -> Result<Employee> {
        self.employee_repo().insert(new).await
    }

    pub async fn update_employee_details(
        &self,
        employee_id: &str,
        update: EmployeeUpdate,
    ) -> Result<()> {
        self.employee_repo().update_details(employee_id, update).await
    }

    pub async fn verify_employee_password(
        &self,
        employee_id: &str,
        password: &str,
    ) -> Result<bool> {
        self.employee_repo()
            .verify_password(employee_id, password)
            .await
    }

    pub async fn update_employee_password(
        &self,
        employee_id: &str,
        new_password: &str,
    ) -> Result<()> {
        self.employee_repo()
            .update_password(employee_id, new_password)
            .await
    }

    // ========================================================================
    // Attendance ledger
    // ========================================================================

    pub async fn get_attendance_for_date(
        &self,
        employee_id: &str,
        date: &str,
    ) -> Result<Option<AttendanceRecord>> {
        self.attendance_repo().get_for_date(employee_id, date).await
    }

    pub async fn insert_attendance_if_absent(
        &self,
        employee_id: &str,
        date: &str,
        in_time: &str,
        status: &str,
        late_time: Option<String>,
    ) -> Result<InsertOutcome> {
        self.attendance_repo()
            .insert_if_absent(employee_id, date, in_time, status, late_time)
            .await
    }

    pub async fn query_attendance(
        &self,
        employee_id: &str,
        filter: &DateFilter,
    ) -> Result<Vec<AttendanceRecord>> {
        self.attendance_repo().query(employee_id, filter).await
    }

    pub async fn find_attendance_first(
        &self,
        employee_id: &str,
        filter: &DateFilter,
    ) -> Result<Option<AttendanceRecord>> {
        self.attendance_repo().find_first(employee_id, filter).await
    }

    pub async fn distinct_attendance_dates(&self) -> Result<Vec<String>> {
        self.attendance_repo().distinct_dates().await
    }

    pub async fn distinct_present_dates(&self, employee_id: &str) -> Result<Vec<String>> {
        self.attendance_repo()
            .distinct_present_dates(employee_id)
            .await
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub async fn get_in_time_threshold(&self, default: &str) -> Result<String> {
        self.settings_repo()
            .get_or_init(IN_TIME_THRESHOLD_KEY, default)
            .await
    }

    pub async fn set_in_time_threshold(&self, value: &str) -> Result<()> {
        self.settings_repo().set(IN_TIME_THRESHOLD_KEY, value).await
    }
}
