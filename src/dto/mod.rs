pub mod analysis_dto;
pub mod authoring_dto;
pub mod grading_dto;
