//! Widget settings repository.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JsonValue, QueryFilter, Set};

use crate::entities::widget_settings;
use parcel_core::settings::{SettingsError, SettingsStore, SettingsUpdate, WidgetSettings};
use parcel_shared::WidgetIdentity;

/// Settings repository implementation.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    db: DatabaseConnection,
}

impl SettingsRepository {
    /// Create a new settings repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl SettingsStore for SettingsRepository {
    async fn widget_settings(
        &self,
        widget: &WidgetIdentity,
    ) -> Result<Option<WidgetSettings>, SettingsError> {
        widget_settings::Entity::find()
            .filter(widget_settings::Column::InstanceId.eq(widget.instance_id.as_str()))
            .filter(widget_settings::Column::ComponentId.eq(widget.component_id.as_str()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(to_settings)
            .transpose()
    }

    async fn save_widget_settings(
        &self,
        widget: &WidgetIdentity,
        update: SettingsUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), SettingsError> {
        let model = widget_settings::ActiveModel {
            instance_id: Set(widget.instance_id.clone()),
            component_id: Set(widget.component_id.clone()),
            user_email: Set(update.user_email),
            provider: Set(None),
            settings: Set(JsonValue::Object(update.settings)),
            updated_at: Set(now.into()),
        };

        // The provider belongs to the sign-in flow and is never overwritten.
        widget_settings::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    widget_settings::Column::InstanceId,
                    widget_settings::Column::ComponentId,
                ])
                .update_columns([
                    widget_settings::Column::UserEmail,
                    widget_settings::Column::Settings,
                    widget_settings::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(())
    }
}

fn db_err(e: DbErr) -> SettingsError {
    SettingsError::repository(e.to_string())
}

fn to_settings(model: widget_settings::Model) -> Result<WidgetSettings, SettingsError> {
    let JsonValue::Object(settings) = model.settings else {
        return Err(SettingsError::repository("stored settings are not an object"));
    };

    Ok(WidgetSettings {
        user_email: model.user_email,
        provider: model.provider.unwrap_or_default(),
        settings,
    })
}
