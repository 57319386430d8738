use std::borrow::Cow;
use std::fmt;

/// Wording used in error messages when a predicate carries no label.
const DEFAULT_LABEL: &str = "the filter criteria";

/// A boolean filter over an entity type, with a label for error messages.
///
/// The query layer treats the test itself as opaque. Plain closures
/// convert implicitly; use [`Predicate::labeled`] when a `NotFound` or
/// `MultipleFound` error should name the filter it ran:
///
/// ```ignore
/// repo.find_single(Predicate::labeled("id == 42", |t: &Track| t.id == 42))
/// ```
pub struct Predicate<'a, T> {
    label: Cow<'static, str>,
    test: Box<dyn Fn(&T) -> bool + Send + Sync + 'a>,
}

impl<'a, T> Predicate<'a, T> {
    /// Wraps a test with the default label.
    pub fn new(test: impl Fn(&T) -> bool + Send + Sync + 'a) -> Self {
        Self::labeled(DEFAULT_LABEL, test)
    }

    /// Wraps a test with a human-readable description of the filter.
    pub fn labeled(
        label: impl Into<Cow<'static, str>>,
        test: impl Fn(&T) -> bool + Send + Sync + 'a,
    ) -> Self {
        Self {
            label: label.into(),
            test: Box::new(test),
        }
    }

    /// The filter description carried into error messages.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Applies the test to one entity.
    #[must_use]
    pub fn test(&self, entity: &T) -> bool {
        (self.test)(entity)
    }
}

impl<'a, T, F> From<F> for Predicate<'a, T>
where
    F: Fn(&T) -> bool + Send + Sync + 'a,
{
    fn from(test: F) -> Self {
        Self::new(test)
    }
}

impl<T> fmt::Debug for Predicate<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_converts_with_default_label() {
        let predicate: Predicate<'_, i32> = (|n: &i32| *n > 2).into();
        assert_eq!(predicate.label(), "the filter criteria");
        assert!(predicate.test(&3));
        assert!(!predicate.test(&1));
    }

    #[test]
    fn labeled_predicate_keeps_its_label() {
        let predicate = Predicate::labeled("n > 2", |n: &i32| *n > 2);
        assert_eq!(predicate.label(), "n > 2");
    }
}
