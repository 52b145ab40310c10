pub mod ledger;
pub mod loaders;
pub mod question;
pub mod result;

pub use ledger::{AnswerLedger, LedgerSlot};
pub use loaders::{load_all_toml_files, load_toml_to_question_set};
pub use question::{Difficulty, Question, QuestionSet};
pub use result::{ExamResult, SubmitReason, Violation, ViolationKind};
