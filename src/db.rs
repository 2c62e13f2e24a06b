pub mod organization_repo;
pub use organization_repo::OrganizationRepository;
pub mod building_repo;
pub use building_repo::BuildingRepository;
pub mod employee_repo;
pub use employee_repo::EmployeeRepository;
pub mod rfid_repo;
pub use rfid_repo::RfidRepository;
pub mod scan_repo;
pub use scan_repo::ScanRepository;
pub mod rule_repo;
pub use rule_repo::RuleRepository;
pub mod notification_repo;
pub use notification_repo::NotificationRepository;
