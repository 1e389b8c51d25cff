pub mod authoring_service;
pub mod batch_service;
pub mod grading_service;
pub mod scoring_service;
pub mod validation_service;
