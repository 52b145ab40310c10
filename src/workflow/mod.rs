pub mod exam_session;
pub mod integrity;

pub use exam_session::{ExamSession, Phase};
pub use integrity::IntegrityMonitor;
