// Núcleo puro (sem banco)
pub mod access_evaluator;
pub mod geometry;
pub mod navigation;
pub mod zone_geometry;
pub mod zone_graph;
pub mod zone_validator;

// Orquestração com banco
pub mod door_service;
pub mod notification_service;
pub mod rfid_service;
pub mod rule_service;
pub mod scan_service;
pub mod time_limit_sweep;
pub mod zone_service;
