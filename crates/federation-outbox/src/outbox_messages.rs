use sea_orm::entity::prelude::*;

/// A domain event waiting to be handed to the bus.
///
/// Rows are immutable; the drainer deletes them in the same transaction that
/// publishes them.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "outbox_messages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub seq: i64,
    #[sea_orm(unique)]
    pub id: Uuid,
    #[sea_orm(column_name = "type")]
    pub message_type: String,
    pub payload: Json,
    pub trace_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
