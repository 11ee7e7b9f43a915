use std::fmt;
use std::time::Instant;
use uuid::Uuid;

/// Per-request data shared with every lifecycle hook.
///
/// `id` is always generated server-side. A client supplied identifier is kept
/// apart in `correlation_id` and never used as a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub id: Uuid,
    pub correlation_id: Option<String>,
    pub method: String,
    pub path: String,
    pub received_at: Instant,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            correlation_id: None,
            method: method.into(),
            path: path.into(),
            received_at: Instant::now(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}]", self.method, self.path, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let ctx = RequestContext::new("GET", "/api/cluster/info");
        assert_eq!(ctx.to_string(), format!("GET /api/cluster/info [{}]", ctx.id));
    }

    #[test]
    fn test_correlation_id_does_not_replace_id() {
        let a = RequestContext::new("GET", "/").with_correlation_id("abc");
        let b = RequestContext::new("GET", "/").with_correlation_id("abc");

        assert_eq!(a.correlation_id.as_deref(), Some("abc"));
        assert_eq!(a.correlation_id, b.correlation_id);
        assert_ne!(a.id, b.id);
    }
}
