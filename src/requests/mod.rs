//! Data Subject Requests
//!
//! データ主体リクエストの受付と状態機械

mod lifecycle;
mod types;

pub use lifecycle::RequestLifecycle;
pub use types::{DataSubjectRequest, RequestStatus, RequestType, SubmitRequest};
