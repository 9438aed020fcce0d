pub mod exam_service;
pub mod llm_service;

pub use exam_service::{
    ExamCatalog, ExamContentService, QuestionGenerator, ScoringService, TeacherResultsService,
};
pub use llm_service::LlmService;
