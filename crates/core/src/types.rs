/// Import jobs are identified by an opaque server-assigned string (a UUID
/// in practice, but the client never interprets it).
pub type JobId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
