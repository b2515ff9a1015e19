use async_trait::async_trait;
use chrono::Utc;
use common::Record;
use common::record::normalize_ids;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use serde_json::Value;
use uuid::Uuid;

use super::{RecordStore, StoreError};
use crate::entity::record;

/// Record store over a PostgreSQL `jsonb` column.
#[derive(Clone)]
pub struct SqlRecordStore {
    db: DatabaseConnection,
}

impl SqlRecordStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Rebuild a record from its row. The row's `id` and `barcode` columns are
/// authoritative over anything in the document body.
fn into_record(model: record::Model) -> Result<Record, StoreError> {
    let mut document = normalize_ids(model.document);
    let Value::Object(map) = &mut document else {
        return Err(StoreError::Corrupt(format!(
            "document for barcode {} is not an object",
            model.barcode
        )));
    };
    map.insert("_id".into(), model.id.to_string().into());
    map.insert("barcode".into(), model.barcode.clone().into());
    serde_json::from_value(document)
        .map_err(|e| StoreError::Corrupt(format!("barcode {}: {e}", model.barcode)))
}

#[async_trait]
impl RecordStore for SqlRecordStore {
    async fn find_one(&self, barcode: &str) -> Result<Option<Record>, StoreError> {
        record::Entity::find()
            .filter(record::Column::Barcode.eq(barcode))
            .one(&self.db)
            .await?
            .map(into_record)
            .transpose()
    }

    async fn find_all(&self) -> Result<Vec<Record>, StoreError> {
        record::Entity::find()
            .order_by_asc(record::Column::CreatedAt)
            .order_by_asc(record::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(into_record)
            .collect()
    }

    async fn find_first(&self) -> Result<Option<Record>, StoreError> {
        record::Entity::find()
            .order_by_asc(record::Column::CreatedAt)
            .order_by_asc(record::Column::Id)
            .one(&self.db)
            .await?
            .map(into_record)
            .transpose()
    }

    async fn insert_one(&self, mut record: Record) -> Result<String, StoreError> {
        record.id = None;
        let barcode = record.barcode.clone();
        let id = Uuid::now_v7();

        let model = record::ActiveModel {
            id: Set(id),
            barcode: Set(barcode.clone()),
            document: Set(normalize_ids(record.to_document())),
            created_at: Set(Utc::now()),
        };

        match record::Entity::insert(model).exec_without_returning(&self.db).await {
            Ok(_) => Ok(id.to_string()),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(StoreError::DuplicateBarcode(barcode))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_one(&self, barcode: &str) -> Result<u64, StoreError> {
        let result = record::Entity::delete_many()
            .filter(record::Column::Barcode.eq(barcode))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
