//! Per-request values passed explicitly to every hook and field updater.

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: Uuid,
    /// Source symbol id when the request duplicates an existing symbol.
    pub old_id: Option<i64>,
}

impl RequestContext {
    pub fn new(old_id: Option<i64>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            old_id,
        }
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn is_duplicate(&self) -> bool {
        self.old_id.is_some()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(None)
    }
}
