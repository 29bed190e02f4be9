#![forbid(unsafe_code)]

pub mod app_services;
pub mod completion_service;
pub mod error;
pub mod level_test_service;
pub mod placement_service;
pub mod progress_service;

pub use app_services::{AppServices, ScoringConfig};
pub use completion_service::{CompletionService, LanguageOverview};
pub use error::{AppServicesError, ProgressServiceError, QuizFlowError};
pub use level_test_service::{LevelTestAvailability, LevelTestService, LevelTestSession};
pub use placement_service::{PlacementResult, PlacementService, PlacementSession};
pub use progress_service::{ProgressService, WriteLocks};
