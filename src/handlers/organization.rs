// src/handlers/organization.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        scope::Scope,
    },
    config::AppState,
    db::ReferenceRepository,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::RequirePermission,
        tenancy::CompanyOverride,
    },
    models::organization::{ReferenceEntity, SearchParams},
};

// Sem vínculo a escrita é negada (e não um 404 silencioso)
fn ensure_linked(scope: &Scope) -> Result<(), AppError> {
    match scope {
        Scope::Unlinked => Err(AppError::Forbidden),
        _ => Ok(()),
    }
}

// ---
// Handlers genéricos (um conjunto por entidade de referência)
// ---

async fn list<T: ReferenceEntity>(
    app_state: AppState,
    locale: Locale,
    user: AuthenticatedUser,
    params: SearchParams,
) -> Result<Json<Vec<T>>, ApiError> {
    let rows = ReferenceRepository::<T>::new(app_state.db_pool.clone())
        .list(&user.scope, params.search.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rows))
}

async fn get_one<T: ReferenceEntity>(
    app_state: AppState,
    locale: Locale,
    user: AuthenticatedUser,
    id: Uuid,
) -> Result<Json<T>, ApiError> {
    let row = ReferenceRepository::<T>::new(app_state.db_pool.clone())
        .get(&user.scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(row))
}

async fn create<T: ReferenceEntity>(
    app_state: AppState,
    locale: Locale,
    user: AuthenticatedUser,
    company: CompanyOverride,
    payload: T::Payload,
) -> Result<(StatusCode, Json<T>), ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let company_id = user
        .write_target(&company)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let row = ReferenceRepository::<T>::new(app_state.db_pool.clone())
        .create(company_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(row)))
}

async fn update<T: ReferenceEntity>(
    app_state: AppState,
    locale: Locale,
    user: AuthenticatedUser,
    id: Uuid,
    payload: T::Payload,
) -> Result<Json<T>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    ensure_linked(&user.scope).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let row = ReferenceRepository::<T>::new(app_state.db_pool.clone())
        .update(&user.scope, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(row))
}

async fn remove<T: ReferenceEntity>(
    app_state: AppState,
    locale: Locale,
    user: AuthenticatedUser,
    id: Uuid,
) -> Result<StatusCode, ApiError> {
    ensure_linked(&user.scope).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    ReferenceRepository::<T>::new(app_state.db_pool.clone())
        .delete(&user.scope, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Endpoints concretos, documentados no OpenAPI
// ---

macro_rules! reference_endpoints {
    (
        $module:ident, $entity:ident, $payload:ident,
        collection = $collection:literal, item = $item:literal, tag = $tag:literal
    ) => {
        pub mod $module {
            use super::*;
            use crate::models::organization::{$entity, $payload};

            type Manage = <$entity as ReferenceEntity>::Manage;

            #[utoipa::path(
                get,
                path = $collection,
                tag = $tag,
                params(SearchParams),
                responses((status = 200, description = "Lista da empresa", body = Vec<$entity>)),
                security(("api_jwt" = []))
            )]
            pub async fn list(
                State(app_state): State<AppState>,
                locale: Locale,
                user: AuthenticatedUser,
                Query(params): Query<SearchParams>,
            ) -> Result<Json<Vec<$entity>>, ApiError> {
                super::list::<$entity>(app_state, locale, user, params).await
            }

            #[utoipa::path(
                post,
                path = $collection,
                tag = $tag,
                request_body = $payload,
                params(("x-company-id" = Option<Uuid>, Header, description = "Empresa destino (operadores da plataforma)")),
                responses(
                    (status = 201, description = "Criado", body = $entity),
                    (status = 409, description = "Nome já usado na empresa")
                ),
                security(("api_jwt" = []))
            )]
            pub async fn create(
                State(app_state): State<AppState>,
                locale: Locale,
                user: AuthenticatedUser,
                company: CompanyOverride,
                _guard: RequirePermission<Manage>,
                Json(payload): Json<$payload>,
            ) -> Result<(StatusCode, Json<$entity>), ApiError> {
                super::create::<$entity>(app_state, locale, user, company, payload).await
            }

            #[utoipa::path(
                get,
                path = $item,
                tag = $tag,
                params(("id" = Uuid, Path)),
                responses((status = 200, description = "Encontrado", body = $entity), (status = 404, description = "Não encontrado")),
                security(("api_jwt" = []))
            )]
            pub async fn get_one(
                State(app_state): State<AppState>,
                locale: Locale,
                user: AuthenticatedUser,
                Path(id): Path<Uuid>,
            ) -> Result<Json<$entity>, ApiError> {
                super::get_one::<$entity>(app_state, locale, user, id).await
            }

            #[utoipa::path(
                put,
                path = $item,
                tag = $tag,
                request_body = $payload,
                params(("id" = Uuid, Path)),
                responses((status = 200, description = "Atualizado", body = $entity), (status = 404, description = "Não encontrado")),
                security(("api_jwt" = []))
            )]
            pub async fn update(
                State(app_state): State<AppState>,
                locale: Locale,
                user: AuthenticatedUser,
                _guard: RequirePermission<Manage>,
                Path(id): Path<Uuid>,
                Json(payload): Json<$payload>,
            ) -> Result<Json<$entity>, ApiError> {
                super::update::<$entity>(app_state, locale, user, id, payload).await
            }

            #[utoipa::path(
                delete,
                path = $item,
                tag = $tag,
                params(("id" = Uuid, Path)),
                responses(
                    (status = 204, description = "Removido"),
                    (status = 404, description = "Não encontrado"),
                    (status = 409, description = "Registro em uso")
                ),
                security(("api_jwt" = []))
            )]
            pub async fn remove(
                State(app_state): State<AppState>,
                locale: Locale,
                user: AuthenticatedUser,
                _guard: RequirePermission<Manage>,
                Path(id): Path<Uuid>,
            ) -> Result<StatusCode, ApiError> {
                super::remove::<$entity>(app_state, locale, user, id).await
            }

            pub fn router() -> Router<AppState> {
                Router::new()
                    .route("/", get(list).post(create))
                    .route("/{id}", get(get_one).put(update).delete(remove))
            }
        }
    };
}

reference_endpoints!(departments, Department, NamedPayload,
    collection = "/api/departments", item = "/api/departments/{id}", tag = "Organization");
reference_endpoints!(job_titles, JobTitle, NamedPayload,
    collection = "/api/job-titles", item = "/api/job-titles/{id}", tag = "Organization");
reference_endpoints!(locations, Location, LocationPayload,
    collection = "/api/locations", item = "/api/locations/{id}", tag = "Organization");
reference_endpoints!(asset_states, AssetState, NamedPayload,
    collection = "/api/asset-states", item = "/api/asset-states/{id}", tag = "Assets");
reference_endpoints!(suppliers, Supplier, SupplierPayload,
    collection = "/api/suppliers", item = "/api/suppliers/{id}", tag = "Procurement");
reference_endpoints!(catalog_items, CatalogItem, CatalogItemPayload,
    collection = "/api/catalog-items", item = "/api/catalog-items/{id}", tag = "Inventory");
