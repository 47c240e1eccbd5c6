// src/services/procurement_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{ensure_owned, OwnedTable},
        error::AppError,
        scope::Scope,
    },
    db::ProcurementRepository,
    models::procurement::{
        Budget, BudgetFilter, BudgetLine, BudgetLinePayload, BudgetPayload, CreatePurchaseOrderPayload,
        PurchaseOrder, PurchaseOrderFilter, PurchaseOrderLine, PurchaseOrderLinePayload, PurchaseOrderStatus,
    },
};

/// Confere uma mudança de estado da ordem.
pub fn check_transition(current: PurchaseOrderStatus, next: PurchaseOrderStatus) -> Result<(), AppError> {
    if current.is_terminal() {
        return Err(AppError::invalid("status", "La orden ya fue cerrada y no admite cambios."));
    }
    if !current.can_transition_to(next) {
        return Err(AppError::invalid("status", "Transición de estado no permitida."));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ProcurementService {
    repo: ProcurementRepository,
    pool: PgPool,
}

impl ProcurementService {
    pub fn new(repo: ProcurementRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    // ---
    // Orçamentos
    // ---

    pub async fn list_budgets(&self, scope: &Scope, filter: &BudgetFilter) -> Result<Vec<Budget>, AppError> {
        self.repo.list_budgets(scope, filter).await
    }

    /// O orçamento pertence à empresa através do departamento.
    pub async fn create_budget(&self, company_id: Uuid, p: &BudgetPayload) -> Result<Budget, AppError> {
        let mut tx = self.pool.begin().await?;
        ensure_owned(&mut *tx, OwnedTable::Department, p.department_id, company_id, "departmentId").await?;
        let budget = self.repo.create_budget(&mut *tx, p).await?;
        tx.commit().await?;
        Ok(budget)
    }

    pub async fn list_budget_lines(&self, scope: &Scope, budget_id: Option<Uuid>) -> Result<Vec<BudgetLine>, AppError> {
        self.repo.list_budget_lines(scope, budget_id).await
    }

    pub async fn create_budget_line(&self, company_id: Uuid, p: &BudgetLinePayload) -> Result<BudgetLine, AppError> {
        let mut tx = self.pool.begin().await?;
        ensure_owned(&mut *tx, OwnedTable::Budget, p.budget_id, company_id, "budgetId").await?;
        let line = self.repo.create_budget_line(&mut *tx, company_id, p).await?;
        tx.commit().await?;
        Ok(line)
    }

    // ---
    // Ordens de compra
    // ---

    pub async fn list_orders(&self, scope: &Scope, filter: &PurchaseOrderFilter) -> Result<Vec<PurchaseOrder>, AppError> {
        self.repo.list_orders(scope, filter).await
    }

    pub async fn get_order(&self, scope: &Scope, id: Uuid) -> Result<PurchaseOrder, AppError> {
        self.repo.get_order(&self.pool, scope, id).await
    }

    pub async fn create_order(
        &self,
        scope: &Scope,
        company_id: Uuid,
        p: &CreatePurchaseOrderPayload,
    ) -> Result<PurchaseOrder, AppError> {
        if let (Some(starts), Some(ends)) = (p.starts_on, p.ends_on) {
            if ends < starts {
                return Err(AppError::invalid("endsOn", "La fecha de fin es anterior a la de inicio."));
            }
        }
        // Sem solicitante explícito, vale quem está criando
        let requested_by = p.requested_by.or(scope.employee_id());

        let mut tx = self.pool.begin().await?;
        if let Some(id) = p.supplier_id {
            ensure_owned(&mut *tx, OwnedTable::Supplier, id, company_id, "supplierId").await?;
        }
        if let Some(id) = requested_by {
            ensure_owned(&mut *tx, OwnedTable::Employee, id, company_id, "requestedBy").await?;
        }
        let order = self.repo.create_order(&mut *tx, company_id, requested_by, p).await?;
        tx.commit().await?;
        Ok(order)
    }

    pub async fn change_status(
        &self,
        scope: &Scope,
        id: Uuid,
        next: PurchaseOrderStatus,
    ) -> Result<PurchaseOrder, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self.repo.lock_order(&mut *tx, scope, id).await?;
        scope.ensure_can_write(order.company_id)?;
        check_transition(order.status, next)?;

        let updated = self.repo.set_order_status(&mut *tx, id, next).await?;
        tx.commit().await?;

        tracing::info!(order_id = %id, from = ?order.status, to = ?next, "🧾 Estado da ordem alterado");
        Ok(updated)
    }

    pub async fn list_lines(&self, scope: &Scope, order_id: Uuid) -> Result<Vec<PurchaseOrderLine>, AppError> {
        let order = self.repo.get_order(&self.pool, scope, order_id).await?;
        self.repo.list_order_lines(order.id).await
    }

    /// Acrescenta uma linha e recalcula o total na mesma transação.
    pub async fn add_line(
        &self,
        scope: &Scope,
        order_id: Uuid,
        p: &PurchaseOrderLinePayload,
    ) -> Result<PurchaseOrderLine, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self.repo.lock_order(&mut *tx, scope, order_id).await?;
        scope.ensure_can_write(order.company_id)?;
        if order.status.is_terminal() {
            return Err(AppError::invalid("orderId", "La orden ya fue cerrada y no admite cambios."));
        }

        ensure_owned(&mut *tx, OwnedTable::BudgetLine, p.budget_line_id, order.company_id, "budgetLineId").await?;
        ensure_owned(&mut *tx, OwnedTable::CatalogItem, p.catalog_item_id, order.company_id, "catalogItemId").await?;

        let line = self.repo.insert_order_line(&mut *tx, order.company_id, order.id, p).await?;
        self.repo.recalculate_order_total(&mut *tx, order.id).await?;

        tx.commit().await?;
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PurchaseOrderStatus::*;

    #[test]
    fn closed_orders_refuse_any_change() {
        for current in [Completed, Cancelled] {
            for next in [Pending, Approved, Completed, Cancelled] {
                assert!(check_transition(current, next).is_err());
            }
        }
    }

    #[test]
    fn open_orders_follow_the_workflow() {
        assert!(check_transition(Pending, Approved).is_ok());
        assert!(check_transition(Approved, Completed).is_ok());
        assert!(check_transition(Pending, Completed).is_err());
        assert!(check_transition(Approved, Approved).is_err());
    }
}
