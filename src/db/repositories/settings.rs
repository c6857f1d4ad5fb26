use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};

use crate::entities::settings;

pub struct SettingsRepository {
    conn: DatabaseConnection,
}

impl SettingsRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = settings::Entity::find_by_id(key)
            .one(&self.conn)
            .await
            .context("Failed to query setting")?;

        Ok(row.map(|r| r.value))
    }

    /// Read a setting, seeding the default when the key has never been
    /// written. Concurrent first reads both resolve to the seeded default.
    pub async fn get_or_init(&self, key: &str, default: &str) -> Result<String> {
        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }

        let active = settings::ActiveModel {
            key: Set(key.to_string()),
            value: Set(default.to_string()),
        };

        let insert = settings::Entity::insert(active)
            .on_conflict(
                OnConflict::column(settings::Column::Key)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&self.conn)
            .await;

        match insert {
            Ok(_) | Err(sea_orm::DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e).context("Failed to seed default setting"),
        }

        Ok(self
            .get(key)
            .await?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Whole-value replacement; no versioning.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let active = settings::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
        };

        settings::Entity::insert(active)
            .on_conflict(
                OnConflict::column(settings::Column::Key)
                    .update_column(settings::Column::Value)
                    .to_owned(),
            )
            .exec(&self.conn)
            .await
            .context("Failed to write setting")?;

        Ok(())
    }
}
