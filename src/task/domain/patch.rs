//! Tri-state field updates used by partial entity patches.

/// Change requested for a nullable field in a partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// Leave the stored value as it is.
    #[default]
    Unchanged,
    /// Clear the stored value.
    Clear,
    /// Replace the stored value.
    Set(T),
}

impl<T> FieldUpdate<T> {
    /// Returns `true` when the update leaves the field untouched.
    #[must_use]
    pub const fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// Resolves the update against the current value, validating a newly
    /// set value with `parse`.
    pub(crate) fn resolve<U, E>(
        self,
        current: Option<U>,
        parse: impl FnOnce(T) -> Result<U, E>,
    ) -> Result<Option<U>, E> {
        match self {
            Self::Unchanged => Ok(current),
            Self::Clear => Ok(None),
            Self::Set(value) => parse(value).map(Some),
        }
    }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
    /// `Some` sets the value, `None` clears it.
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Clear, Self::Set)
    }
}
