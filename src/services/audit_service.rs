// src/services/audit_service.rs

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    common::{error::AppError, scope::Scope},
    db::{AuditRepository, UserRepository},
    models::audit::{AuditLogEntry, AuditLogFilter, NewAuditEntry},
};

/// Destino das entradas da bitácora. Fica atrás de um trait para que o banco
/// de auditoria possa ser trocado (ou simulado nos testes).
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn write(&self, entry: &NewAuditEntry) -> Result<AuditLogEntry, AppError>;
}

#[async_trait]
impl AuditSink for AuditRepository {
    async fn write(&self, entry: &NewAuditEntry) -> Result<AuditLogEntry, AppError> {
        self.insert(entry).await
    }
}

#[derive(Clone)]
pub struct AuditService {
    sink: Arc<dyn AuditSink>,
    reader: AuditRepository,
    user_repo: UserRepository,
}

impl AuditService {
    pub fn new(sink: Arc<dyn AuditSink>, reader: AuditRepository, user_repo: UserRepository) -> Self {
        Self { sink, reader, user_repo }
    }

    pub async fn list(&self, scope: &Scope, filter: &AuditLogFilter) -> Result<Vec<AuditLogEntry>, AppError> {
        self.reader.list(scope, filter).await
    }

    /// Grava a entrada depois de conferir, no banco principal, os ids que ela cita.
    /// Os bancos são distintos: não há chave estrangeira para fazer isso por nós.
    pub async fn record(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, AppError> {
        self.check_references(&entry).await?;
        self.sink.write(&entry).await
    }

    /// Variante para efeitos colaterais: falhas são só logadas.
    pub async fn record_best_effort(&self, entry: NewAuditEntry) {
        let action = entry.action.clone();
        if let Err(e) = self.record(entry).await {
            tracing::warn!(%action, "⚠️ Falha ao gravar na bitácora: {:?}", e);
        }
    }

    async fn check_references(&self, entry: &NewAuditEntry) -> Result<(), AppError> {
        let Some(user_id) = entry.user_id else {
            if entry.tenant_id.is_some() {
                return Err(AppError::invalid("tenantId", "Empresa sin usuario asociado."));
            }
            return Ok(());
        };

        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::invalid("userId", "Usuario inexistente."))?;

        if let Some(tenant_id) = entry.tenant_id {
            let link = self.user_repo.find_employee_link(user_id).await?;
            if link.map(|l| l.company_id) != Some(tenant_id) {
                return Err(AppError::invalid("tenantId", "El usuario no pertenece a esta empresa."));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use sqlx::PgPool;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct MemorySink {
        entries: Mutex<Vec<NewAuditEntry>>,
        fail: bool,
    }

    #[async_trait]
    impl AuditSink for MemorySink {
        async fn write(&self, entry: &NewAuditEntry) -> Result<AuditLogEntry, AppError> {
            if self.fail {
                return Err(AppError::InternalServerError(anyhow::anyhow!("audit store down")));
            }
            self.entries.lock().unwrap().push(entry.clone());
            Ok(AuditLogEntry {
                id: Uuid::new_v4(),
                user_id: entry.user_id,
                client_ip: entry.client_ip.clone(),
                action: entry.action.clone(),
                tenant_id: entry.tenant_id,
                payload: entry.payload.clone(),
                created_at: Utc::now(),
            })
        }
    }

    // Pool preguiçoso: nenhuma conexão é aberta enquanto não houver consulta
    fn service(sink: Arc<MemorySink>) -> AuditService {
        let pool = PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        AuditService::new(sink, AuditRepository::new(pool.clone()), UserRepository::new(pool))
    }

    fn anonymous_entry() -> NewAuditEntry {
        NewAuditEntry {
            user_id: None,
            client_ip: Some("10.0.0.1".into()),
            action: "SYSTEM_CHECK".into(),
            tenant_id: None,
            payload: json!({ "ok": true }),
        }
    }

    #[tokio::test]
    async fn entries_without_references_go_straight_to_the_sink() {
        let sink = Arc::new(MemorySink::default());
        let saved = service(sink.clone()).record(anonymous_entry()).await.unwrap();
        assert_eq!(saved.action, "SYSTEM_CHECK");
        assert_eq!(sink.entries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn tenant_without_user_is_rejected_before_writing() {
        let sink = Arc::new(MemorySink::default());
        let entry = NewAuditEntry { tenant_id: Some(Uuid::new_v4()), ..anonymous_entry() };
        assert!(service(sink.clone()).record(entry).await.is_err());
        assert!(sink.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn best_effort_swallows_sink_failures() {
        let sink = Arc::new(MemorySink { fail: true, ..Default::default() });
        service(sink.clone()).record_best_effort(anonymous_entry()).await;
        assert!(sink.entries.lock().unwrap().is_empty());
    }
}
