// src/services/asset_service.rs

use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{ensure_owned, OwnedTable},
        error::AppError,
        scope::Scope,
    },
    db::{asset_repo::NewRevaluation, AssetRepository},
    models::{
        assets::{
            max_asset_value, Asset, AssetFilter, AssetPayload, ExecuteRevaluationPayload, Revaluation,
            RevaluationFilter, RevaluationMethod,
        },
        tenancy::LimitKind,
    },
    services::{notification_service::NotificationService, tenancy_service::TenantService},
};

const VALUE_DP: u32 = 2;
const FACTOR_DP: u32 = 6;
const MAX_FACTOR_INT: i64 = 100_000_000_000_000;

fn overflow() -> AppError {
    AppError::invalid("value", "El resultado excede el rango permitido.")
}

/// Calcula (novo valor, fator) de uma reavaliação.
///
/// Valores em 2 casas e fator em 6, arredondando metade para longe do zero.
/// Nada é gravado aqui; erros saem antes de qualquer escrita.
pub fn compute_revaluation(
    old: Decimal,
    method: RevaluationMethod,
    value: Decimal,
) -> Result<(Decimal, Decimal), AppError> {
    match method {
        RevaluationMethod::Percentage if value <= -Decimal::ONE_HUNDRED => {
            return Err(AppError::invalid("value", "El porcentaje debe ser mayor a -100."));
        }
        RevaluationMethod::Factor | RevaluationMethod::Fixed if value < Decimal::ZERO => {
            return Err(AppError::invalid("value", "El valor no puede ser negativo."));
        }
        _ => {}
    }

    if old.is_zero() && method != RevaluationMethod::Fixed {
        return Err(AppError::invalid(
            "method",
            "El activo tiene valor 0; solo se admite el método 'fixed'.",
        ));
    }

    let (new_value, factor) = match method {
        RevaluationMethod::Factor => (old.checked_mul(value).ok_or_else(overflow)?, value),
        RevaluationMethod::Fixed => {
            let factor = if old > Decimal::ZERO {
                value.checked_div(old).ok_or_else(overflow)?
            } else {
                Decimal::ZERO
            };
            (value, factor)
        }
        RevaluationMethod::Percentage => {
            let factor = Decimal::ONE + value / Decimal::ONE_HUNDRED;
            (old.checked_mul(factor).ok_or_else(overflow)?, factor)
        }
    };

    let new_value = new_value.round_dp_with_strategy(VALUE_DP, RoundingStrategy::MidpointAwayFromZero);
    let factor = factor.round_dp_with_strategy(FACTOR_DP, RoundingStrategy::MidpointAwayFromZero);

    // Mesmos limites das colunas: new_value NUMERIC(12, 2), factor NUMERIC(20, 6)
    if new_value > max_asset_value() || factor >= Decimal::from(MAX_FACTOR_INT) {
        return Err(overflow());
    }
    Ok((new_value, factor))
}

#[derive(Clone)]
pub struct AssetService {
    repo: AssetRepository,
    tenant_service: TenantService,
    notifications: NotificationService,
    pool: PgPool,
}

impl AssetService {
    pub fn new(
        repo: AssetRepository,
        tenant_service: TenantService,
        notifications: NotificationService,
        pool: PgPool,
    ) -> Self {
        Self { repo, tenant_service, notifications, pool }
    }

    pub async fn list(&self, scope: &Scope, filter: &AssetFilter) -> Result<Vec<Asset>, AppError> {
        self.repo.list(scope, filter).await
    }

    pub async fn get(&self, scope: &Scope, id: Uuid) -> Result<Asset, AppError> {
        self.repo.get(scope, id).await
    }

    pub async fn create(&self, company_id: Uuid, actor_user_id: Uuid, p: &AssetPayload) -> Result<Asset, AppError> {
        let mut tx = self.pool.begin().await?;

        let warning = self
            .tenant_service
            .reserve_capacity(&mut *tx, company_id, LimitKind::Assets)
            .await?;
        Self::check_refs(&mut *tx, company_id, p).await?;

        let asset = self.repo.create(&mut *tx, company_id, p).await?;

        tx.commit().await?;

        tracing::info!(asset_id = %asset.id, %company_id, "📦 Ativo cadastrado");
        if let Some(warning) = warning {
            self.notifications.deliver_capacity_warning(&warning, actor_user_id).await;
        }
        Ok(asset)
    }

    pub async fn update(&self, scope: &Scope, id: Uuid, p: &AssetPayload) -> Result<Asset, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self.repo.lock_for_update(&mut *tx, scope, id).await?;
        scope.ensure_can_write(current.company_id)?;
        Self::check_refs(&mut *tx, current.company_id, p).await?;

        let asset = self.repo.update(&mut *tx, scope, id, p).await?;

        tx.commit().await?;
        Ok(asset)
    }

    pub async fn delete(&self, scope: &Scope, id: Uuid) -> Result<(), AppError> {
        self.repo.delete(scope, id).await
    }

    pub async fn list_revaluations(&self, scope: &Scope, filter: &RevaluationFilter) -> Result<Vec<Revaluation>, AppError> {
        self.repo.list_revaluations(scope, filter).await
    }

    /// Reavalia um ativo: trava a linha, calcula, grava o histórico e o novo valor.
    pub async fn execute_revaluation(
        &self,
        scope: &Scope,
        actor_user_id: Uuid,
        p: &ExecuteRevaluationPayload,
    ) -> Result<Revaluation, AppError> {
        if matches!(scope, Scope::Unlinked) {
            return Err(AppError::Forbidden);
        }
        let method = p.parsed_method()?;
        let value = p.parsed_value()?;

        let mut tx = self.pool.begin().await?;

        let asset = self.repo.lock_for_update(&mut *tx, scope, p.asset_id).await?;
        let (new_value, factor) = compute_revaluation(asset.current_value, method, value)?;

        let record = self
            .repo
            .insert_revaluation(
                &mut *tx,
                &NewRevaluation {
                    company_id: asset.company_id,
                    asset_id: asset.id,
                    method,
                    previous_value: asset.current_value,
                    new_value,
                    factor,
                    notes: p.notes.as_deref(),
                    performed_by: actor_user_id,
                },
            )
            .await?;
        self.repo.set_current_value(&mut *tx, asset.id, new_value).await?;

        tx.commit().await?;

        tracing::info!(
            asset_id = %asset.id,
            previous = %asset.current_value,
            new = %new_value,
            "📈 Reavaliação executada"
        );
        Ok(record)
    }

    // Referências opcionais precisam ser da mesma empresa do ativo
    async fn check_refs(conn: &mut PgConnection, company_id: Uuid, p: &AssetPayload) -> Result<(), AppError> {
        ensure_owned(&mut *conn, OwnedTable::AssetState, p.state_id, company_id, "stateId").await?;

        let optional = [
            (OwnedTable::CatalogItem, p.catalog_item_id, "catalogItemId"),
            (OwnedTable::Department, p.department_id, "departmentId"),
            (OwnedTable::Location, p.location_id, "locationId"),
            (OwnedTable::Supplier, p.supplier_id, "supplierId"),
        ];
        for (table, id, field) in optional {
            if let Some(id) = id {
                ensure_owned(&mut *conn, table, id, company_id, field).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::{self, SeededCompany};
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn factor_multiplies_current_value() {
        let (new, factor) = compute_revaluation(dec("1000"), RevaluationMethod::Factor, dec("1.25")).unwrap();
        assert_eq!(new, dec("1250.00"));
        assert_eq!(factor, dec("1.25"));
    }

    #[test]
    fn percentage_builds_factor_from_rate() {
        let (new, factor) = compute_revaluation(dec("200"), RevaluationMethod::Percentage, dec("-15")).unwrap();
        assert_eq!(factor, dec("0.85"));
        assert_eq!(new, dec("170.00"));
    }

    #[test]
    fn fixed_derives_factor_from_old_value() {
        let (new, factor) = compute_revaluation(dec("300"), RevaluationMethod::Fixed, dec("100")).unwrap();
        assert_eq!(new, dec("100"));
        assert_eq!(factor, dec("0.333333"));
    }

    #[test]
    fn fixed_on_zero_valued_asset_has_zero_factor() {
        let (new, factor) = compute_revaluation(Decimal::ZERO, RevaluationMethod::Fixed, dec("500")).unwrap();
        assert_eq!(new, dec("500"));
        assert_eq!(factor, Decimal::ZERO);
    }

    #[test]
    fn zero_valued_asset_rejects_relative_methods() {
        for method in [RevaluationMethod::Factor, RevaluationMethod::Percentage] {
            assert!(matches!(
                compute_revaluation(Decimal::ZERO, method, dec("2")),
                Err(AppError::InvalidInput { .. })
            ));
        }
    }

    #[test]
    fn percentage_at_or_below_minus_hundred_is_rejected() {
        assert!(compute_revaluation(dec("10"), RevaluationMethod::Percentage, dec("-100")).is_err());
        assert!(compute_revaluation(dec("10"), RevaluationMethod::Percentage, dec("-150")).is_err());
        assert!(compute_revaluation(dec("10"), RevaluationMethod::Percentage, dec("-99.99")).is_ok());
    }

    #[test]
    fn negative_factor_or_fixed_value_is_rejected() {
        assert!(compute_revaluation(dec("10"), RevaluationMethod::Factor, dec("-0.5")).is_err());
        assert!(compute_revaluation(dec("10"), RevaluationMethod::Fixed, dec("-1")).is_err());
        assert!(compute_revaluation(dec("10"), RevaluationMethod::Factor, Decimal::ZERO).is_ok());
    }

    #[test]
    fn new_value_rounds_half_away_from_zero() {
        // 10.01 * 1.5 = 15.015 -> 15.02
        let (new, _) = compute_revaluation(dec("10.01"), RevaluationMethod::Factor, dec("1.5")).unwrap();
        assert_eq!(new, dec("15.02"));
    }

    #[test]
    fn fixed_ratio_on_cheap_asset_is_kept() {
        // 20000 / 1.00 não cabia em NUMERIC(10, 6)
        let (new, factor) = compute_revaluation(dec("1.00"), RevaluationMethod::Fixed, dec("20000")).unwrap();
        assert_eq!(new, dec("20000"));
        assert_eq!(factor, dec("20000"));

        let (_, factor) = compute_revaluation(dec("0.01"), RevaluationMethod::Fixed, dec("9999999999.99")).unwrap();
        assert_eq!(factor, dec("999999999999"));
    }

    #[test]
    fn result_above_column_range_is_a_validation_error() {
        let too_big = [
            (dec("5000000000"), RevaluationMethod::Factor, dec("3")),
            (dec("5000000000"), RevaluationMethod::Percentage, dec("150")),
            (dec("1"), RevaluationMethod::Fixed, dec("10000000000")),
        ];
        for (old, method, value) in too_big {
            match compute_revaluation(old, method, value) {
                Err(AppError::InvalidInput { field, .. }) => assert_eq!(field, "value"),
                other => panic!("{method:?} deveria falhar, veio {other:?}"),
            }
        }
    }

    #[test]
    fn result_at_column_maximum_is_accepted() {
        let (new, _) = compute_revaluation(dec("1"), RevaluationMethod::Fixed, dec("9999999999.99")).unwrap();
        assert_eq!(new, max_asset_value());
        let (new, _) = compute_revaluation(dec("3333333333.33"), RevaluationMethod::Factor, dec("3")).unwrap();
        assert_eq!(new, dec("9999999999.99"));
    }

    proptest! {
        #[test]
        fn factor_method_keeps_the_given_factor(
            cents in 1i64..10_000_000,
            factor_millis in 0i64..10_000,
        ) {
            let old = Decimal::new(cents, 2);
            let f = Decimal::new(factor_millis, 3);
            let (new, factor) = compute_revaluation(old, RevaluationMethod::Factor, f).unwrap();
            prop_assert_eq!(factor, f);
            prop_assert_eq!(new, (old * f).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero));
            prop_assert!(!new.is_sign_negative() || new.is_zero());
        }

        #[test]
        fn percentage_above_minus_hundred_never_goes_negative(
            cents in 1i64..10_000_000,
            pct_hundredths in -9_999i64..100_000,
        ) {
            let old = Decimal::new(cents, 2);
            let pct = Decimal::new(pct_hundredths, 2);
            let (new, factor) = compute_revaluation(old, RevaluationMethod::Percentage, pct).unwrap();
            prop_assert!(factor > Decimal::ZERO);
            prop_assert!(new >= Decimal::ZERO);
        }
    }

    // ---
    // Contra o banco
    // ---

    fn asset_payload(company: &SeededCompany, code: &str) -> AssetPayload {
        AssetPayload {
            name: format!("Laptop {code}"),
            internal_code: code.to_string(),
            serial_number: None,
            acquired_on: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            current_value: dec("1500"),
            useful_life_years: 4,
            catalog_item_id: None,
            department_id: None,
            location_id: None,
            supplier_id: None,
            state_id: company.state_id,
        }
    }

    fn revaluation(asset_id: Uuid, method: &str, value: &str) -> ExecuteRevaluationPayload {
        ExecuteRevaluationPayload {
            asset_id,
            method: method.to_string(),
            value: json!(value),
            notes: None,
        }
    }

    const ASSETS_OF_COMPANY: &str = "SELECT COUNT(*) FROM assets WHERE company_id = $1";

    #[sqlx::test(migrations = "./migrations")]
    async fn concurrent_revaluations_serialize_on_the_asset_row(pool: PgPool) {
        let app = test_support::app_state(pool.clone());
        let acme = test_support::seed_company(&pool, "Acme", 5, 50).await;
        let asset_id = test_support::seed_asset(&pool, &acme, "AF-1", dec("100"), None).await;
        let scope = acme.scope();

        let first = revaluation(asset_id, "factor", "2");
        let second = revaluation(asset_id, "factor", "2");
        let (a, b) = tokio::join!(
            app.asset_service.execute_revaluation(&scope, acme.user_id, &first),
            app.asset_service.execute_revaluation(&scope, acme.user_id, &second),
        );
        a.unwrap();
        b.unwrap();

        // Cada reavaliação parte do valor deixado pela anterior
        let history: Vec<(Decimal, Decimal)> = sqlx::query_as(
            "SELECT previous_value, new_value FROM revaluations WHERE asset_id = $1 ORDER BY previous_value",
        )
        .bind(asset_id)
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(history, vec![(dec("100"), dec("200")), (dec("200"), dec("400"))]);

        let asset = app.asset_service.get(&scope, asset_id).await.unwrap();
        assert_eq!(asset.current_value, dec("400"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn overflowing_revaluation_is_rejected_without_writes(pool: PgPool) {
        let app = test_support::app_state(pool.clone());
        let acme = test_support::seed_company(&pool, "Acme", 5, 50).await;
        let asset_id = test_support::seed_asset(&pool, &acme, "AF-1", dec("5000000000"), None).await;

        let err = app
            .asset_service
            .execute_revaluation(&acme.scope(), acme.user_id, &revaluation(asset_id, "factor", "3"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { .. }));

        // Razão fixa grande em ativo barato cabe na coluna do fator
        let cheap_id = test_support::seed_asset(&pool, &acme, "AF-2", dec("1.00"), None).await;
        let record = app
            .asset_service
            .execute_revaluation(&acme.scope(), acme.user_id, &revaluation(cheap_id, "fijo", "20000"))
            .await
            .unwrap();
        assert_eq!(record.factor, dec("20000"));

        let records = test_support::count(&pool, "SELECT COUNT(*) FROM revaluations WHERE asset_id = $1", asset_id).await;
        assert_eq!(records, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn creation_beyond_the_plan_cap_is_rejected(pool: PgPool) {
        let app = test_support::app_state(pool.clone());
        let acme = test_support::seed_company(&pool, "Acme", 5, 2).await;

        for code in ["AF-1", "AF-2"] {
            app.asset_service
                .create(acme.company_id, acme.user_id, &asset_payload(&acme, code))
                .await
                .unwrap();
        }
        let err = app
            .asset_service
            .create(acme.company_id, acme.user_id, &asset_payload(&acme, "AF-3"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::CapacityExceeded { limit: 2, .. }));
        assert_eq!(test_support::count(&pool, ASSETS_OF_COMPANY, acme.company_id).await, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn threshold_warning_is_sent_once_per_day(pool: PgPool) {
        let app = test_support::app_state(pool.clone());
        let acme = test_support::seed_company(&pool, "Acme", 5, 20).await;
        for i in 0..18 {
            test_support::seed_asset(&pool, &acme, &format!("OLD-{i}"), dec("10"), None).await;
        }

        // 19/20 e 20/20 passam de 90%: os dois disparam o mesmo aviso
        for code in ["AF-19", "AF-20"] {
            app.asset_service
                .create(acme.company_id, acme.user_id, &asset_payload(&acme, code))
                .await
                .unwrap();
        }

        let unread = test_support::count(
            &pool,
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND kind = 'WARNING' AND NOT is_read",
            acme.user_id,
        )
        .await;
        assert_eq!(unread, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn other_company_assets_look_absent(pool: PgPool) {
        let app = test_support::app_state(pool.clone());
        let acme = test_support::seed_company(&pool, "Acme", 5, 50).await;
        let beta = test_support::seed_company(&pool, "Beta", 5, 50).await;
        let beta_asset = test_support::seed_asset(&pool, &beta, "BF-1", dec("700"), None).await;

        assert!(matches!(
            app.asset_service.get(&acme.scope(), beta_asset).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            app.asset_service
                .execute_revaluation(&acme.scope(), acme.user_id, &revaluation(beta_asset, "factor", "2"))
                .await,
            Err(AppError::NotFound(_))
        ));
        assert!(app.asset_service.list(&acme.scope(), &AssetFilter::default()).await.unwrap().is_empty());

        let untouched = app.asset_service.get(&beta.scope(), beta_asset).await.unwrap();
        assert_eq!(untouched.current_value, dec("700"));
    }
}
