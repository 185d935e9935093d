//! Service layer for business logic.

pub mod resource_service;

pub use resource_service::ResourceService;
