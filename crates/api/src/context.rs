use groundwork_jwt::Claims;

/// Authenticated identity for a request, taken from verified token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    claims: Claims,
}

impl PrincipalContext {
    pub fn new(claims: Claims) -> Self {
        Self { claims }
    }

    pub fn uid(&self) -> &str {
        &self.claims.uid
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}
