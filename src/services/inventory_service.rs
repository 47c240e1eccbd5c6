// src/services/inventory_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{ensure_owned, OwnedTable},
        error::AppError,
        scope::Scope,
    },
    db::InventoryRepository,
    models::inventory::{
        apply_delta, CreateStockMovementPayload, CreateStockRecordPayload, StockMovement, StockMovementFilter,
        StockRecord, StockRecordFilter,
    },
};

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    pool: PgPool,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository, pool: PgPool) -> Self {
        Self { inventory_repo, pool }
    }

    pub async fn list_records(&self, scope: &Scope, filter: &StockRecordFilter) -> Result<Vec<StockRecord>, AppError> {
        self.inventory_repo.list_records(scope, filter).await
    }

    pub async fn get_record(&self, scope: &Scope, id: Uuid) -> Result<StockRecord, AppError> {
        self.inventory_repo.get_record(scope, id).await
    }

    pub async fn list_movements(
        &self,
        scope: &Scope,
        filter: &StockMovementFilter,
    ) -> Result<Vec<StockMovement>, AppError> {
        self.inventory_repo.list_movements(scope, filter).await
    }

    pub async fn create_record(&self, company_id: Uuid, p: &CreateStockRecordPayload) -> Result<StockRecord, AppError> {
        let mut tx = self.pool.begin().await?;

        ensure_owned(&mut *tx, OwnedTable::Location, p.location_id, company_id, "locationId").await?;
        ensure_owned(&mut *tx, OwnedTable::CatalogItem, p.catalog_item_id, company_id, "catalogItemId").await?;
        if let Some(id) = p.purchase_line_id {
            ensure_owned(&mut *tx, OwnedTable::PurchaseOrderLine, id, company_id, "purchaseLineId").await?;
        }
        if let Some(id) = p.responsible_employee_id {
            ensure_owned(&mut *tx, OwnedTable::Employee, id, company_id, "responsibleEmployeeId").await?;
        }

        let record = self.inventory_repo.create_record(&mut *tx, company_id, p).await?;
        tx.commit().await?;
        Ok(record)
    }

    /// Registra uma movimentação e ajusta o saldo sob trava da linha.
    pub async fn record_movement(&self, scope: &Scope, p: &CreateStockMovementPayload) -> Result<StockMovement, AppError> {
        if matches!(scope, Scope::Unlinked) {
            return Err(AppError::Forbidden);
        }
        p.kind.check_delta(p.quantity_delta)?;

        let mut tx = self.pool.begin().await?;

        let record = self.inventory_repo.lock_record(&mut *tx, scope, p.stock_record_id).await?;
        let next = apply_delta(record.quantity, p.quantity_delta)?;

        let movement = self
            .inventory_repo
            .insert_movement(&mut *tx, record.id, p.kind, p.quantity_delta, p.note.as_deref())
            .await?;
        self.inventory_repo.set_quantity(&mut *tx, record.id, next).await?;

        tx.commit().await?;

        tracing::debug!(stock_record_id = %record.id, from = record.quantity, to = next, "Saldo ajustado");
        Ok(movement)
    }
}
