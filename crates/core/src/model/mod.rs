mod ids;
mod question;
mod response;
mod session;

pub use ids::QuestionId;
pub use question::{
    Alternatives, DEFAULT_SUBJECT, Question, QuestionDraft, QuestionError, QuestionKind,
};
pub use response::{Response, ResponseStats};
pub use session::{Advance, RevealOutcome, SessionState, SessionStateError};
