// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        BuildingRepository, EmployeeRepository, NotificationRepository, OrganizationRepository, RfidRepository,
        RuleRepository, ScanRepository,
    },
    services::{
        door_service::DoorService,
        notification_service::{NotificationService, PgNotificationSink, RealtimeHub},
        rfid_service::RfidService,
        rule_service::RuleService,
        scan_service::ScanService,
        time_limit_sweep::TimeLimitSweeper,
        zone_service::ZoneService,
    },
};

/// Valores lidos do ambiente (`.env` incluso).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub scan_ingest_key: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub sweep_interval: Duration,
}

fn parse_or<T: std::str::FromStr>(name: &str, raw: Option<String>, default: T) -> anyhow::Result<T> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| anyhow::anyhow!("{} inválido: {}", name, value)),
        None => Ok(default),
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de uma função de busca (o ambiente, em produção).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| lookup(key).with_context(|| format!("{} deve ser definida", key));

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            scan_ingest_key: required("SCAN_INGEST_KEY")?,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", lookup("DB_MAX_CONNECTIONS"), 5)?,
            sweep_interval: Duration::from_secs(parse_or("TIME_LIMIT_SWEEP_SECS", lookup("TIME_LIMIT_SWEEP_SECS"), 60)?),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub scan_ingest_key: String,
    pub org_repo: OrganizationRepository,
    pub notification_repo: NotificationRepository,
    pub zone_service: ZoneService,
    pub door_service: DoorService,
    pub rfid_service: RfidService,
    pub rule_service: RuleService,
    pub scan_service: ScanService,
    pub time_limit_sweeper: TimeLimitSweeper,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let org_repo = OrganizationRepository::new(db_pool.clone());
        let building_repo = BuildingRepository::new(db_pool.clone());
        let employee_repo = EmployeeRepository::new(db_pool.clone());
        let rfid_repo = RfidRepository::new(db_pool.clone());
        let scan_repo = ScanRepository::new(db_pool.clone());
        let rule_repo = RuleRepository::new(db_pool.clone());
        let notification_repo = NotificationRepository::new(db_pool.clone());

        let notification_service = NotificationService::new(
            Arc::new(PgNotificationSink::new(notification_repo.clone())),
            RealtimeHub::new(256),
        );

        let zone_service = ZoneService::new(db_pool.clone(), building_repo.clone());
        let door_service = DoorService::new(db_pool.clone(), building_repo.clone(), zone_service.clone());
        let rfid_service = RfidService::new(
            db_pool.clone(),
            rfid_repo.clone(),
            building_repo.clone(),
            employee_repo.clone(),
        );
        let rule_service = RuleService::new(
            db_pool.clone(),
            rule_repo.clone(),
            building_repo.clone(),
            employee_repo.clone(),
        );
        let scan_service = ScanService::new(
            db_pool.clone(),
            scan_repo.clone(),
            rfid_repo,
            employee_repo.clone(),
            building_repo.clone(),
            rule_repo.clone(),
            org_repo.clone(),
            notification_service.clone(),
        );
        let time_limit_sweeper = TimeLimitSweeper::new(
            db_pool.clone(),
            rule_repo,
            scan_repo,
            employee_repo,
            building_repo,
            org_repo.clone(),
            notification_repo.clone(),
            scan_service.clone(),
            notification_service,
        );

        Ok(Self {
            db_pool,
            jwt_secret: settings.jwt_secret.clone(),
            scan_ingest_key: settings.scan_ingest_key.clone(),
            org_repo,
            notification_repo,
            zone_service,
            door_service,
            rfid_service,
            rule_service,
            scan_service,
            time_limit_sweeper,
        })
    }
}
