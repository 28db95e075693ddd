pub mod cache;
pub mod history;
pub mod quota;

pub use cache::{Session, SessionCache};
pub use history::{ChatEntry, ChatRole, ConversationHistory};
pub use quota::{QuotaDecision, QuotaPolicy, Tier};
