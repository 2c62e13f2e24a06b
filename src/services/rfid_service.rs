// src/services/rfid_service.rs

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BuildingRepository, EmployeeRepository, RfidRepository},
    models::access::{RfidReader, RfidTag, TagAssignment},
};

#[derive(Clone)]
pub struct RfidService {
    pool: PgPool,
    repo: RfidRepository,
    building_repo: BuildingRepository,
    employee_repo: EmployeeRepository,
}

impl RfidService {
    pub fn new(
        pool: PgPool,
        repo: RfidRepository,
        building_repo: BuildingRepository,
        employee_repo: EmployeeRepository,
    ) -> Self {
        Self { pool, repo, building_repo, employee_repo }
    }

    /// A porta precisa existir e pertencer à mesma organização do leitor.
    async fn require_door_in_organization(&self, organization_id: Uuid, door_id: Uuid) -> Result<(), AppError> {
        let (_, door_org) = self
            .building_repo
            .door_owner(&self.pool, door_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Porta {}", door_id)))?;

        if door_org != organization_id {
            return Err(AppError::CrossOrganization(format!(
                "A porta {} pertence a outra organização",
                door_id
            )));
        }
        Ok(())
    }

    pub async fn create_reader(
        &self,
        organization_id: Uuid,
        serial_number: i64,
        door_id: Option<Uuid>,
    ) -> Result<RfidReader, AppError> {
        if let Some(door_id) = door_id {
            self.require_door_in_organization(organization_id, door_id).await?;
        }
        self.repo.create_reader(&self.pool, organization_id, serial_number, door_id).await
    }

    /// Monta (ou desmonta, com `None`) o leitor em uma porta.
    pub async fn attach_reader(
        &self,
        organization_id: Uuid,
        reader_id: Uuid,
        door_id: Option<Uuid>,
    ) -> Result<RfidReader, AppError> {
        self.repo
            .find_reader(&self.pool, organization_id, reader_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Leitor {}", reader_id)))?;

        if let Some(door_id) = door_id {
            self.require_door_in_organization(organization_id, door_id).await?;
        }
        self.repo.set_reader_door(&self.pool, reader_id, door_id).await
    }

    pub async fn create_tag(&self, organization_id: Uuid, uid: i64) -> Result<RfidTag, AppError> {
        self.repo.create_tag(&self.pool, organization_id, uid).await
    }

    /// Registra uma nova atribuição da tag; `None` recolhe a tag.
    pub async fn assign_tag(
        &self,
        organization_id: Uuid,
        tag_id: Uuid,
        employee_id: Option<Uuid>,
    ) -> Result<TagAssignment, AppError> {
        self.repo
            .find_tag(&self.pool, organization_id, tag_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tag {}", tag_id)))?;

        if let Some(employee_id) = employee_id {
            let employee = self
                .employee_repo
                .find(&self.pool, employee_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Funcionário {}", employee_id)))?;
            if employee.organization_id != organization_id {
                return Err(AppError::CrossOrganization(format!(
                    "O funcionário {} pertence a outra organização",
                    employee_id
                )));
            }
        }

        self.repo
            .insert_assignment(&self.pool, tag_id, employee_id, Utc::now())
            .await
    }
}
