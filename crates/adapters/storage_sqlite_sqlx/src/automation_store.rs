//! `SQLite` implementation of [`AutomationStore`].

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tokio::sync::broadcast;

use tempo_app::ports::{AutomationStore, RecordChange};
use tempo_domain::automation::Automation;
use tempo_domain::error::{TempoError, ValidationError};
use tempo_domain::id::AutomationId;
use tempo_domain::schedule::{Schedule, WeekdaySet};
use tempo_domain::time::ClockTime;

use crate::error::StorageError;

/// Decode one stored row into an [`Automation`].
///
/// Schedule fields are stored as text and validated here, so a record
/// written with a bad clock or timezone surfaces as a per-record error
/// rather than poisoning whole-table reads.
fn decode_row(row: &SqliteRow) -> Result<Automation, TempoError> {
    let id: uuid::Uuid = row.try_get("id").map_err(StorageError::from)?;
    let path: String = row.try_get("path").map_err(StorageError::from)?;
    let turn_on: bool = row.try_get("turn_on").map_err(StorageError::from)?;
    let clock_raw: String = row.try_get("clock").map_err(StorageError::from)?;
    let timezone_raw: String = row.try_get("timezone").map_err(StorageError::from)?;
    let days_raw: String = row.try_get("days").map_err(StorageError::from)?;
    let repeat: bool = row.try_get("is_repeat").map_err(StorageError::from)?;

    let clock: ClockTime = clock_raw.parse()?;
    let timezone = timezone_raw
        .parse()
        .map_err(|_| ValidationError::UnknownTimezone(timezone_raw.clone()))?;
    let days: WeekdaySet = serde_json::from_str(&days_raw).map_err(StorageError::from)?;

    Ok(Automation {
        id: AutomationId::from_uuid(id),
        path,
        turn_on,
        schedule: Schedule {
            clock,
            timezone,
            days,
        },
        repeat,
    })
}

/// `SQLite`-backed automation store with an in-process change feed.
///
/// Mutations made through this store are broadcast to subscribers so the
/// reactive dispatch path sees them immediately. Writers that bypass the
/// store (other processes) are picked up by the minute sweep instead.
#[derive(Clone)]
pub struct SqliteAutomationStore {
    pool: SqlitePool,
    changes: broadcast::Sender<RecordChange>,
}

impl SqliteAutomationStore {
    /// Create a new store backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(256);
        Self { pool, changes }
    }

    fn notify(&self, change: RecordChange) {
        // Send fails only when there are zero receivers, which is fine.
        let _ = self.changes.send(change);
    }
}

impl AutomationStore for SqliteAutomationStore {
    async fn create(&self, automation: Automation) -> Result<Automation, TempoError> {
        automation.validate()?;

        let id = automation.id.as_uuid();
        let days_json =
            serde_json::to_string(&automation.schedule.days).map_err(StorageError::from)?;

        sqlx::query(
            "INSERT INTO automations (id, path, turn_on, clock, timezone, days, is_repeat) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&automation.path)
        .bind(automation.turn_on)
        .bind(automation.schedule.clock.to_string())
        .bind(automation.schedule.timezone.name())
        .bind(&days_json)
        .bind(automation.repeat)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        self.notify(RecordChange::Added(automation.clone()));
        Ok(automation)
    }

    async fn get_by_id(&self, id: AutomationId) -> Result<Option<Automation>, TempoError> {
        let row = sqlx::query("SELECT * FROM automations WHERE id = ?")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn get_all(&self) -> Result<Vec<Automation>, TempoError> {
        let rows = sqlx::query("SELECT * FROM automations ORDER BY path")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let mut automations = Vec::with_capacity(rows.len());
        for row in &rows {
            match decode_row(row) {
                Ok(automation) => automations.push(automation),
                Err(err) => {
                    let id: Option<uuid::Uuid> = row.try_get("id").ok();
                    tracing::warn!(
                        automation_id = ?id,
                        %err,
                        "skipping malformed automation row"
                    );
                }
            }
        }
        Ok(automations)
    }

    async fn update(&self, automation: Automation) -> Result<Automation, TempoError> {
        automation.validate()?;

        let id = automation.id.as_uuid();
        let days_json =
            serde_json::to_string(&automation.schedule.days).map_err(StorageError::from)?;

        sqlx::query(
            "UPDATE automations SET path = ?, turn_on = ?, clock = ?, timezone = ?, days = ?, is_repeat = ? WHERE id = ?",
        )
        .bind(&automation.path)
        .bind(automation.turn_on)
        .bind(automation.schedule.clock.to_string())
        .bind(automation.schedule.timezone.name())
        .bind(&days_json)
        .bind(automation.repeat)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        self.notify(RecordChange::Modified(automation.clone()));
        Ok(automation)
    }

    async fn delete(&self, id: AutomationId) -> Result<(), TempoError> {
        sqlx::query("DELETE FROM automations WHERE id = ?")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        self.notify(RecordChange::Removed(id));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<RecordChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use chrono::Weekday;
    use chrono_tz::Tz;

    async fn setup() -> SqliteAutomationStore {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteAutomationStore::new(db.pool().clone())
    }

    fn valid_automation() -> Automation {
        Automation::builder()
            .path("home/livingroom/lamp")
            .turn_on(true)
            .schedule(Schedule {
                clock: "07:00".parse().unwrap(),
                timezone: Tz::America__New_York,
                days: [Weekday::Mon, Weekday::Wed, Weekday::Fri].into_iter().collect(),
            })
            .repeat(false)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_create_and_retrieve_automation() {
        let store = setup().await;
        let automation = valid_automation();
        let id = automation.id;

        store.create(automation.clone()).await.unwrap();
        let found = store.get_by_id(id).await.unwrap();

        assert_eq!(found, Some(automation));
    }

    #[tokio::test]
    async fn should_return_none_for_unknown_id() {
        let store = setup().await;
        let found = store.get_by_id(AutomationId::new()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn should_list_all_automations() {
        let store = setup().await;
        store.create(valid_automation()).await.unwrap();
        let mut second = valid_automation();
        second.id = AutomationId::new();
        second.path = "home/kitchen/light".to_string();
        store.create(second).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn should_update_existing_automation() {
        let store = setup().await;
        let mut automation = store.create(valid_automation()).await.unwrap();

        automation.turn_on = false;
        automation.schedule.clock = "21:15".parse().unwrap();
        store.update(automation.clone()).await.unwrap();

        let found = store.get_by_id(automation.id).await.unwrap().unwrap();
        assert!(!found.turn_on);
        assert_eq!(found.schedule.clock.to_string(), "21:15");
    }

    #[tokio::test]
    async fn should_delete_automation() {
        let store = setup().await;
        let automation = store.create(valid_automation()).await.unwrap();

        store.delete(automation.id).await.unwrap();

        assert!(store.get_by_id(automation.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_reject_invalid_automation_on_create() {
        let store = setup().await;
        let mut automation = valid_automation();
        automation.path = String::new();

        let result = store.create(automation).await;
        assert!(matches!(result, Err(TempoError::Validation(_))));
    }

    #[tokio::test]
    async fn should_notify_subscribers_of_mutations() {
        let store = setup().await;
        let mut changes = store.subscribe();

        let automation = store.create(valid_automation()).await.unwrap();
        assert!(matches!(
            changes.recv().await.unwrap(),
            RecordChange::Added(a) if a.id == automation.id
        ));

        store.update(automation.clone()).await.unwrap();
        assert!(matches!(
            changes.recv().await.unwrap(),
            RecordChange::Modified(a) if a.id == automation.id
        ));

        store.delete(automation.id).await.unwrap();
        assert!(matches!(
            changes.recv().await.unwrap(),
            RecordChange::Removed(id) if id == automation.id
        ));
    }

    async fn insert_raw(
        store: &SqliteAutomationStore,
        clock: &str,
        timezone: &str,
        days: &str,
    ) {
        sqlx::query(
            "INSERT INTO automations (id, path, turn_on, clock, timezone, days, is_repeat) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4())
        .bind("home/garage/door")
        .bind(true)
        .bind(clock)
        .bind(timezone)
        .bind(days)
        .bind(true)
        .execute(&store.pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn should_skip_malformed_rows_instead_of_failing_the_query() {
        let store = setup().await;
        store.create(valid_automation()).await.unwrap();
        insert_raw(&store, "25:99", "America/New_York", "[1]").await;
        insert_raw(&store, "07:00", "Mars/Olympus", "[1]").await;
        insert_raw(&store, "07:00", "America/New_York", "[0, 9]").await;

        let all = store.get_all().await.unwrap();

        assert_eq!(all.len(), 1, "only the valid record survives decoding");
        assert_eq!(all[0].path, "home/livingroom/lamp");
    }

    #[tokio::test]
    async fn should_normalize_string_weekdays_from_storage() {
        let store = setup().await;
        insert_raw(&store, "07:00", "America/New_York", r#"["6", "7"]"#).await;

        let all = store.get_all().await.unwrap();

        assert_eq!(all.len(), 1);
        assert!(all[0].schedule.days.contains(Weekday::Sat));
        assert!(all[0].schedule.days.contains(Weekday::Sun));
    }

    #[tokio::test]
    async fn should_error_when_fetching_malformed_record_by_id() {
        let store = setup().await;
        let id = uuid::Uuid::new_v4();
        sqlx::query(
            "INSERT INTO automations (id, path, turn_on, clock, timezone, days, is_repeat) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind("home/garage/door")
        .bind(true)
        .bind("bad-clock")
        .bind("America/New_York")
        .bind("[1]")
        .bind(true)
        .execute(&store.pool)
        .await
        .unwrap();

        let result = store.get_by_id(AutomationId::from_uuid(id)).await;
        assert!(result.is_err());
    }
}
