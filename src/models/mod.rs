pub mod exam;
pub mod results;
pub mod timestamp;

pub use exam::{Exam, ExamContent, GeneratedQuestion, NewExam, Question};
pub use results::{ExamResult, HistoryEntry, TeacherResult, UserProfile};
