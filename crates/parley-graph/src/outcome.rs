use std::fmt::Display;
use std::future::Future;

/// Result of an operation whose failures are absorbed rather than raised.
///
/// `Degraded` still carries a usable value (an empty history, a fallback
/// reply) together with the reason the real one could not be produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Completed(T),
    Degraded { value: T, reason: String },
}

impl<T> Outcome<T> {
    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Self::Degraded {
            value,
            reason: reason.into(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Completed(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Completed(value) | Self::Degraded { value, .. } => value,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Completed(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Completed(value) => Outcome::Completed(f(value)),
            Self::Degraded { value, reason } => Outcome::Degraded {
                value: f(value),
                reason,
            },
        }
    }
}

/// Await `fut`; on error log it and substitute `fallback()`.
///
/// The caller's span supplies identifying fields (thread token, user).
pub async fn best_effort<T, E, F>(
    operation: &'static str,
    fut: F,
    fallback: impl FnOnce() -> T,
) -> Outcome<T>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match fut.await {
        Ok(value) => Outcome::Completed(value),
        Err(e) => {
            let reason = format!("{operation}: {e}");
            tracing::warn!(operation, error = %e, "Absorbed failure, continuing degraded");
            Outcome::Degraded {
                value: fallback(),
                reason,
            }
        }
    }
}
