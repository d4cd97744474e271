pub mod activity;
pub mod blanks;
pub mod letters;
pub mod policy;
pub mod result;

pub use activity::{ActivitySession, SubmitOutcome};
pub use policy::{Activity, Phase};
pub use result::{SessionFilter, SessionMode, SessionRecord, SessionWordResult};
