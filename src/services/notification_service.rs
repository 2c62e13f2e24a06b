// src/services/notification_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::NotificationRepository,
    models::access::{Notification, NotificationKind},
};

/// Dados de uma notificação ainda não gravada.
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub organization_id: Uuid,
    pub employee_id: Uuid,
    pub zone_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

/// Destino externo das notificações (persistência).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn create_notification(&self, draft: NotificationDraft) -> Result<Notification, AppError>;
}

#[derive(Clone)]
pub struct PgNotificationSink {
    repo: NotificationRepository,
}

impl PgNotificationSink {
    pub fn new(repo: NotificationRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl NotificationSink for PgNotificationSink {
    async fn create_notification(&self, draft: NotificationDraft) -> Result<Notification, AppError> {
        self.repo.insert(self.repo.pool(), &draft).await
    }
}

// --- Tempo real ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum Recipient {
    Employee(Uuid),
    Admin(Uuid),
}

#[derive(Debug, Clone, Serialize)]
pub struct RealtimeEvent {
    pub recipient: Recipient,
    pub payload: Notification,
}

/// Canal em memória para os consumidores em tempo real (websocket, SSE...).
/// Entrega sem garantia: sem assinantes, o evento é descartado.
///
/// Este serviço não expõe transporte de tempo real; hoje nenhum assinante existe em
/// produção e a notificação persistida é a fonte de verdade. A camada de transporte,
/// quando existir, consome os eventos via `subscribe`.
#[derive(Clone)]
pub struct RealtimeHub {
    sender: broadcast::Sender<RealtimeEvent>,
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.sender.subscribe()
    }

    pub fn emit_to_employee(&self, employee_id: Uuid, payload: &Notification) {
        self.emit(Recipient::Employee(employee_id), payload);
    }

    pub fn emit_to_admin(&self, admin_id: Uuid, payload: &Notification) {
        self.emit(Recipient::Admin(admin_id), payload);
    }

    fn emit(&self, recipient: Recipient, payload: &Notification) {
        let event = RealtimeEvent { recipient, payload: payload.clone() };
        if self.sender.send(event).is_err() {
            tracing::debug!("Nenhum assinante em tempo real para {:?}", recipient);
        }
    }
}

#[derive(Clone)]
pub struct NotificationService {
    sink: Arc<dyn NotificationSink>,
    hub: RealtimeHub,
}

impl NotificationService {
    pub fn new(sink: Arc<dyn NotificationSink>, hub: RealtimeHub) -> Self {
        Self { sink, hub }
    }

    /// Grava a notificação e avisa o funcionário e o administrador da organização.
    pub async fn notify(&self, draft: NotificationDraft, admin_id: Uuid) -> Result<Notification, AppError> {
        let notification = self.sink.create_notification(draft).await?;

        tracing::info!(
            "🔔 {:?} para funcionário {} na zona {}",
            notification.kind,
            notification.employee_id,
            notification.zone_id
        );

        self.hub.emit_to_employee(notification.employee_id, &notification);
        self.hub.emit_to_admin(admin_id, &notification);

        Ok(notification)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::MemorySink;
    use super::*;

    fn draft(employee_id: Uuid) -> NotificationDraft {
        NotificationDraft {
            organization_id: Uuid::new_v4(),
            employee_id,
            zone_id: Uuid::new_v4(),
            kind: NotificationKind::ForbiddenZone,
            title: "Unauthorized Zone Access".into(),
            message: "entered".into(),
        }
    }

    #[tokio::test]
    async fn notify_persists_and_pushes_to_employee_and_admin() {
        let sink = Arc::new(MemorySink::default());
        let hub = RealtimeHub::new(16);
        let mut rx = hub.subscribe();
        let service = NotificationService::new(sink.clone(), hub);

        let (employee, admin) = (Uuid::new_v4(), Uuid::new_v4());
        let created = service.notify(draft(employee), admin).await.unwrap();

        assert_eq!(sink.created.lock().unwrap().len(), 1);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.recipient, Recipient::Employee(employee));
        assert_eq!(second.recipient, Recipient::Admin(admin));
        assert_eq!(second.payload.id, created.id);
    }

    #[tokio::test]
    async fn notify_without_subscribers_still_succeeds() {
        let service = NotificationService::new(Arc::new(MemorySink::default()), RealtimeHub::new(4));
        assert!(service.notify(draft(Uuid::new_v4()), Uuid::new_v4()).await.is_ok());
    }

    #[test]
    fn recipient_serializes_with_type_tag() {
        let id = Uuid::nil();
        let json = serde_json::to_value(Recipient::Admin(id)).unwrap();
        assert_eq!(json["type"], "admin");
        assert_eq!(json["id"], id.to_string());
    }
}
