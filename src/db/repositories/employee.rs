use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tokio::task;

use crate::entities::employees;

/// Employee data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct Employee {
    pub id: i32,
    pub employee_id: String,
    pub email: String,
    pub employee_name: String,
    pub department: String,
    pub face_image: String,
    pub created_at: String,
}

impl From<employees::Model> for Employee {
    fn from(model: employees::Model) -> Self {
        Self {
            id: model.id,
            employee_id: model.employee_id,
            email: model.email,
            employee_name: model.employee_name,
            department: model.department,
            face_image: model.face_image,
            created_at: model.created_at,
        }
    }
}

/// Fields of a new employee row; the password is hashed on insert.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub employee_id: String,
    pub email: String,
    pub employee_name: String,
    pub department: String,
    pub password: String,
    pub face_image: String,
}

/// Partial detail update applied after OTP confirmation.
#[derive(Debug, Clone)]
pub struct EmployeeUpdate {
    pub employee_name: String,
    pub email: String,
    pub department: String,
    pub face_image: Option<String>,
}

pub struct EmployeeRepository {
    conn: DatabaseConnection,
}

impl EmployeeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_employee_id(&self, employee_id: &str) -> Result<Option<Employee>> {
        let row = employees::Entity::find()
            .filter(employees::Column::EmployeeId.eq(employee_id))
            .one(&self.conn)
            .await
            .context("Failed to query employee by id")?;

        Ok(row.map(Employee::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Employee>> {
        let row = employees::Entity::find()
            .filter(employees::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query employee by email")?;

        Ok(row.map(Employee::from))
    }

    pub async fn get_by_id_and_email(
        &self,
        employee_id: &str,
        email: &str,
    ) -> Result<Option<Employee>> {
        let row = employees::Entity::find()
            .filter(employees::Column::EmployeeId.eq(employee_id))
            .filter(employees::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query employee by id and email")?;

        Ok(row.map(Employee::from))
    }

    pub async fn list_all(&self) -> Result<Vec<Employee>> {
        let rows = employees::Entity::find()
            .all(&self.conn)
            .await
            .context("Failed to list employees")?;

        Ok(rows.into_iter().map(Employee::from).collect())
    }

    pub async fn insert(&self, new: NewEmployee) -> Result<Employee> {
        let password = new.password;
        let password_hash = task::spawn_blocking(move || hash_password(&password))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let active = employees::ActiveModel {
            employee_id: Set(new.employee_id),
            email: Set(new.email),
            employee_name: Set(new.employee_name),
            department: Set(new.department),
            password_hash: Set(password_hash),
            face_image: Set(new.face_image),
            created_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert employee")?;

        Ok(Employee::from(model))
    }

    pub async fn update_details(&self, employee_id: &str, update: EmployeeUpdate) -> Result<()> {
        let row = employees::Entity::find()
            .filter(employees::Column::EmployeeId.eq(employee_id))
            .one(&self.conn)
            .await
            .context("Failed to query employee for update")?
            .ok_or_else(|| anyhow::anyhow!("Employee not found: {employee_id}"))?;

        let mut active: employees::ActiveModel = row.into();
        active.employee_name = Set(update.employee_name);
        active.email = Set(update.email);
        active.department = Set(update.department);
        if let Some(image) = update.face_image {
            active.face_image = Set(image);
        }
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Verify password for an employee.
    /// Note: This uses `spawn_blocking` because Argon2 verification is
    /// CPU-intensive and would block the async runtime if run directly.
    pub async fn verify_password(&self, employee_id: &str, password: &str) -> Result<bool> {
        let row = employees::Entity::find()
            .filter(employees::Column::EmployeeId.eq(employee_id))
            .one(&self.conn)
            .await
            .context("Failed to query employee for password verification")?;

        let Some(row) = row else {
            return Ok(false);
        };

        let password_hash = row.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    pub async fn update_password(&self, employee_id: &str, new_password: &str) -> Result<()> {
        let row = employees::Entity::find()
            .filter(employees::Column::EmployeeId.eq(employee_id))
            .one(&self.conn)
            .await
            .context("Failed to query employee for password update")?
            .ok_or_else(|| anyhow::anyhow!("Employee not found: {employee_id}"))?;

        let password = new_password.to_string();
        let new_hash = task::spawn_blocking(move || hash_password(&password))
            .await
            .context("Password hashing task panicked")??;

        let mut active: employees::ActiveModel = row.into();
        active.password_hash = Set(new_hash);
        active.update(&self.conn).await?;

        Ok(())
    }
}

/// Hash a password using Argon2id with default params.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
