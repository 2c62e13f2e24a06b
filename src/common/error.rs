// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::middleware::i18n::Locale;
use crate::models::building::{DoorSide, Rect};

/// Limite exigido para a variação de tamanho quando a coordenada do mesmo eixo muda.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBound {
    AtMost(i32),
    AtLeast(i32),
}

impl fmt::Display for SizeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeBound::AtMost(v) => write!(f, "<= {}", v),
            SizeBound::AtLeast(v) => write!(f, ">= {}", v),
        }
    }
}

fn id_or_new(id: &Option<Uuid>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "(new)".to_string())
}

/// Sub-casos de geometria inválida. As mensagens vão para `details` da resposta,
/// por isso carregam os ids e os números envolvidos.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("zone does not touch any existing zone in its placement scope")]
    NoIntersectionWithScope,

    #[error("zone {} overlaps zone {other_zone_id}", id_or_new(.zone_id))]
    OverlapDetected {
        zone_id: Option<Uuid>,
        other_zone_id: Uuid,
    },

    #[error("shared edge is too short: required {required}, available {available}")]
    InsufficientIntersectionLength { required: i32, available: i32 },

    #[error("zones {zone_a} and {zone_b} do not share an edge")]
    ZonesNotAdjacent { zone_a: Uuid, zone_b: Uuid },

    #[error("{coordinate} changed by {coordinate_delta}, so {size} change must be {required} (got {actual})")]
    CoordinateSizeMismatch {
        coordinate: &'static str,
        size: &'static str,
        coordinate_delta: i32,
        required: SizeBound,
        actual: i32,
    },

    #[error("zone must be at least 2x2 (got {width}x{height})")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("no free space for {required} entrance door(s) on the {side:?} side of zone {zone_id}: room for {available}")]
    EntranceDoorNoSpace {
        zone_id: Uuid,
        side: DoorSide,
        required: i32,
        available: i32,
    },

    #[error("door {} between zones {zone_a} and {zone_b} needs {required} units of shared edge, available {available}", id_or_new(.door_id))]
    RegularDoorNoSpace {
        door_id: Option<Uuid>,
        zone_a: Uuid,
        zone_b: Uuid,
        required: i32,
        available: i32,
    },

    #[error("door {door_id} would no longer connect zones {zone_a} and {zone_b}")]
    DisconnectionWouldResult {
        door_id: Uuid,
        zone_a: Uuid,
        zone_b: Uuid,
    },

    #[error("at least one of x, y, width, height must change")]
    AtLeastOneFieldRequired,

    #[error("zone at ({}, {}) sized {}x{} leaves the allowed area", .rect.x, .rect.y, .rect.width, .rect.height)]
    OutOfBounds { rect: Rect },
}

impl GeometryError {
    pub fn code(&self) -> &'static str {
        match self {
            GeometryError::NoIntersectionWithScope => "NO_INTERSECTION_WITH_SCOPE",
            GeometryError::OverlapDetected { .. } => "OVERLAP_DETECTED",
            GeometryError::InsufficientIntersectionLength { .. } => "INSUFFICIENT_INTERSECTION_LENGTH",
            GeometryError::ZonesNotAdjacent { .. } => "ZONES_NOT_ADJACENT",
            GeometryError::CoordinateSizeMismatch { .. } => "COORDINATE_SIZE_MISMATCH",
            GeometryError::InvalidDimensions { .. } => "INVALID_DIMENSIONS",
            GeometryError::EntranceDoorNoSpace { .. } => "ENTRANCE_DOOR_NO_SPACE",
            GeometryError::RegularDoorNoSpace { .. } => "REGULAR_DOOR_NO_SPACE",
            GeometryError::DisconnectionWouldResult { .. } => "DISCONNECTION_WOULD_RESULT",
            GeometryError::AtLeastOneFieldRequired => "AT_LEAST_ONE_FIELD_REQUIRED",
            GeometryError::OutOfBounds { .. } => "OUT_OF_BOUNDS",
        }
    }
}

// Nosso tipo de erro de domínio, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Recurso não encontrado: {0}")]
    NotFound(String),

    #[error("Acesso negado")]
    AccessDenied,

    #[error("Geometria inválida: {0}")]
    InvalidGeometry(#[from] GeometryError),

    #[error("Recursos de organizações diferentes: {0}")]
    CrossOrganization(String),

    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("Invariante violada: {0}")]
    InvariantViolation(String),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// O erro que de fato sai na resposta HTTP (já traduzido).
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Converte para a resposta pública no idioma do cliente (`pt` ou `en`).
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let pt = locale.0 == "pt";
        let pick = |pt_msg: &str, en_msg: &str| if pt { pt_msg.to_string() } else { en_msg.to_string() };

        match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| e.code.to_string()))
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                ApiError {
                    status: StatusCode::BAD_REQUEST,
                    error: pick("Um ou mais campos são inválidos.", "One or more fields are invalid."),
                    details: Some(Value::Object(details)),
                }
            }
            AppError::NotFound(what) => ApiError {
                status: StatusCode::NOT_FOUND,
                error: pick("Recurso não encontrado.", "Resource not found."),
                details: Some(json!({ "resource": what })),
            },
            AppError::AccessDenied => ApiError {
                status: StatusCode::FORBIDDEN,
                error: pick("Você não tem acesso a esta organização.", "You do not have access to this organization."),
                details: None,
            },
            AppError::InvalidGeometry(geometry) => ApiError {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: pick("Geometria da zona inválida.", "Invalid zone geometry."),
                details: Some(json!({ "code": geometry.code(), "message": geometry.to_string() })),
            },
            AppError::CrossOrganization(what) => ApiError {
                status: StatusCode::FORBIDDEN,
                error: pick("Os recursos pertencem a organizações diferentes.", "Resources belong to different organizations."),
                details: Some(json!({ "message": what })),
            },
            AppError::Conflict(what) => ApiError {
                status: StatusCode::CONFLICT,
                error: pick("O recurso já existe.", "Resource already exists."),
                details: Some(json!({ "message": what })),
            },
            AppError::InvariantViolation(what) => ApiError {
                status: StatusCode::CONFLICT,
                error: pick("Operação não permitida.", "Operation not allowed."),
                details: Some(json!({ "message": what })),
            },
            AppError::InvalidToken | AppError::JwtError(_) => ApiError {
                status: StatusCode::UNAUTHORIZED,
                error: pick("Token de autenticação inválido ou ausente.", "Missing or invalid authentication token."),
                details: None,
            },
            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                ApiError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: pick("Ocorreu um erro inesperado.", "An unexpected error occurred."),
                    details: None,
                }
            }
        }
    }

    /// Converte violações de unicidade do Postgres em `Conflict`.
    pub fn from_unique_violation(e: sqlx::Error, message: &str) -> Self {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return AppError::Conflict(message.to_string());
            }
        }
        AppError::DatabaseError(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}
