/// Use cases module containing application business logic orchestration
mod audit_components;
mod scan_organization;
mod scan_repository;

pub use audit_components::AuditComponentsUseCase;
pub use scan_organization::ScanOrganizationUseCase;
pub use scan_repository::ScanRepositoryUseCase;
