use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};

use crate::entities::attendance_records;

/// A row in the attendance ledger.
#[derive(Debug, Clone)]
pub struct AttendanceRecord {
    pub employee_id: String,
    pub date: String,
    pub in_time: String,
    pub status: String,
    pub late_time: Option<String>,
    pub recorded_at: String,
}

impl From<attendance_records::Model> for AttendanceRecord {
    fn from(model: attendance_records::Model) -> Self {
        Self {
            employee_id: model.employee_id,
            date: model.date,
            in_time: model.in_time,
            status: model.status,
            late_time: model.late_time,
            recorded_at: model.recorded_at,
        }
    }
}

/// Optional date constraints for ledger queries. `date` wins over `month`.
#[derive(Debug, Clone, Default)]
pub struct DateFilter {
    /// Exact day, YYYY-MM-DD
    pub date: Option<String>,
    /// Month prefix, YYYY-MM
    pub month: Option<String>,
}

/// Result of an idempotent ledger insert.
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    Inserted(AttendanceRecord),
    /// A record for (employee, date) already existed; carries the winner.
    AlreadyExists(AttendanceRecord),
}

pub struct AttendanceRepository {
    conn: DatabaseConnection,
}

impl AttendanceRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_for_date(
        &self,
        employee_id: &str,
        date: &str,
    ) -> Result<Option<AttendanceRecord>> {
        let row = attendance_records::Entity::find()
            .filter(attendance_records::Column::EmployeeId.eq(employee_id))
            .filter(attendance_records::Column::Date.eq(date))
            .one(&self.conn)
            .await
            .context("Failed to query attendance record")?;

        Ok(row.map(AttendanceRecord::from))
    }

    /// Atomic first-write-wins insert for (employee, date).
    ///
    /// Relies on the unique index over (employee_id, date): the insert is
    /// issued with ON CONFLICT DO NOTHING, so of two concurrent calls
    /// exactly one inserts and the other reads back the existing row.
    pub async fn insert_if_absent(
        &self,
        employee_id: &str,
        date: &str,
        in_time: &str,
        status: &str,
        late_time: Option<String>,
    ) -> Result<InsertOutcome> {
        let active = attendance_records::ActiveModel {
            employee_id: Set(employee_id.to_string()),
            date: Set(date.to_string()),
            in_time: Set(in_time.to_string()),
            status: Set(status.to_string()),
            late_time: Set(late_time),
            recorded_at: Set(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        };

        let insert = attendance_records::Entity::insert(active)
            .on_conflict(
                OnConflict::columns([
                    attendance_records::Column::EmployeeId,
                    attendance_records::Column::Date,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(&self.conn)
            .await;

        match insert {
            Ok(_) => {
                let record = self
                    .get_for_date(employee_id, date)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("Inserted attendance record not found"))?;
                Ok(InsertOutcome::Inserted(record))
            }
            Err(DbErr::RecordNotInserted) => {
                let record = self
                    .get_for_date(employee_id, date)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("Conflicting attendance record not found"))?;
                Ok(InsertOutcome::AlreadyExists(record))
            }
            Err(e) => Err(e).context("Failed to insert attendance record"),
        }
    }

    /// Ledger rows for one employee, newest first (date desc, then
    /// recorded_at desc).
    pub async fn query(&self, employee_id: &str, filter: &DateFilter) -> Result<Vec<AttendanceRecord>> {
        let mut select = attendance_records::Entity::find()
            .filter(attendance_records::Column::EmployeeId.eq(employee_id));

        if let Some(date) = &filter.date {
            select = select.filter(attendance_records::Column::Date.eq(date));
        } else if let Some(month) = &filter.month {
            select = select.filter(attendance_records::Column::Date.starts_with(month));
        }

        let rows = select
            .order_by_desc(attendance_records::Column::Date)
            .order_by_desc(attendance_records::Column::RecordedAt)
            .all(&self.conn)
            .await
            .context("Failed to query attendance records")?;

        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }

    /// First matching record for an employee under the filter; used by the
    /// roster join.
    pub async fn find_first(
        &self,
        employee_id: &str,
        filter: &DateFilter,
    ) -> Result<Option<AttendanceRecord>> {
        let mut select = attendance_records::Entity::find()
            .filter(attendance_records::Column::EmployeeId.eq(employee_id));

        if let Some(date) = &filter.date {
            select = select.filter(attendance_records::Column::Date.eq(date));
        } else if let Some(month) = &filter.month {
            select = select.filter(attendance_records::Column::Date.starts_with(month));
        }

        let row = select
            .order_by_desc(attendance_records::Column::Date)
            .one(&self.conn)
            .await
            .context("Failed to query attendance record for roster")?;

        Ok(row.map(AttendanceRecord::from))
    }

    /// All distinct dates with at least one record, any employee.
    pub async fn distinct_dates(&self) -> Result<Vec<String>> {
        let dates: Vec<String> = attendance_records::Entity::find()
            .select_only()
            .column(attendance_records::Column::Date)
            .distinct()
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query distinct attendance dates")?;

        Ok(dates)
    }

    /// Distinct dates on which the given employee was present.
    pub async fn distinct_present_dates(&self, employee_id: &str) -> Result<Vec<String>> {
        let dates: Vec<String> = attendance_records::Entity::find()
            .select_only()
            .column(attendance_records::Column::Date)
            .distinct()
            .filter(attendance_records::Column::EmployeeId.eq(employee_id))
            .filter(attendance_records::Column::Status.eq("present"))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query distinct present dates")?;

        Ok(dates)
    }
}
