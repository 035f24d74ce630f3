use uuid::Uuid;

/// Correlation header attached to every backend request. The backend scopes
/// its knowledge base and generation state by this value.
pub const SESSION_HEADER: &str = "X-Session-ID";

/// Opaque per-client-instance identity. Created once at startup and immutable
/// afterwards; collision avoidance is the only requirement, so a random UUID
/// with the hyphens stripped (no separator characters) is enough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: String,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
        }
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
