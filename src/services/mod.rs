pub mod calendar_service;
pub mod health_service;
pub mod token_service;
