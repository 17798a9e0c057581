//! Binder configuration.

/// How an unqualified field name that exists in several FROM tables is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbiguityPolicy {
    /// Fail with an ambiguous-field error.
    #[default]
    Reject,
    /// Pick the first matching table in FROM order.
    FirstMatch,
}

/// Configuration for the SELECT binder.
#[derive(Debug, Clone, Default)]
pub struct BinderConfig {
    /// Policy for unqualified field names found in several tables.
    pub ambiguity: AmbiguityPolicy,
    /// Display `table.field` even when only one table is in scope.
    pub qualify_single_table: bool,
}

impl BinderConfig {
    /// Creates a new binder configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ambiguity policy.
    #[must_use]
    pub fn with_ambiguity(mut self, ambiguity: AmbiguityPolicy) -> Self {
        self.ambiguity = ambiguity;
        self
    }

    /// Forces qualified display names for single-table statements.
    #[must_use]
    pub fn with_qualify_single_table(mut self, qualify: bool) -> Self {
        self.qualify_single_table = qualify;
        self
    }

    /// Returns whether display names are qualified for the given scope size.
    #[must_use]
    pub fn qualify(&self, single_table: bool) -> bool {
        !single_table || self.qualify_single_table
    }
}
