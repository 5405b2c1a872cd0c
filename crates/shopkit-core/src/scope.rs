use std::time::{Duration, Instant};

/// The seller a request is scoped to.
///
/// Every seller-filtered catalog accessor takes a `TenantScope`, so a read
/// that forgets the tenant filter does not compile. Construction validates
/// that the id is positive; there is no other way to obtain a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TenantScope(i64);

impl TenantScope {
    /// Returns `None` unless `seller_id` is a positive integer.
    #[must_use]
    pub fn new(seller_id: i64) -> Option<Self> {
        (seller_id > 0).then_some(Self(seller_id))
    }

    #[must_use]
    pub fn seller_id(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TenantScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Absolute deadline for one recommender operation.
///
/// The transport sets a single budget per request; each catalog query runs
/// under whatever slice of that budget remains when it starts.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Instant,
}

impl Deadline {
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Instant::now() + budget,
        }
    }

    /// Remaining budget, or `None` once the deadline has passed.
    #[must_use]
    pub fn remaining(self) -> Option<Duration> {
        let now = Instant::now();
        (now < self.expires_at).then(|| self.expires_at - now)
    }

    #[must_use]
    pub fn is_expired(self) -> bool {
        self.remaining().is_none()
    }
}
