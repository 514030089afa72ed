//! What "unchanged" means for an input value.
//!
//! Nothing here is picked implicitly: holders for `PartialEq` types default
//! to [`ByValue`], everything else names its policy.

use std::sync::Arc;

pub trait ValueEq<T>: Send + Sync + 'static {
    fn same(&self, a: &T, b: &T) -> bool;
}

/// Compare with `PartialEq`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByValue;

impl<T: PartialEq> ValueEq<T> for ByValue {
    fn same(&self, a: &T, b: &T) -> bool {
        a == b
    }
}

/// Compare `Arc`s by pointer: two values are the same only if they are the
/// same allocation.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByIdentity;

impl<U: ?Sized + 'static> ValueEq<Arc<U>> for ByIdentity {
    fn same(&self, a: &Arc<U>, b: &Arc<U>) -> bool {
        Arc::ptr_eq(a, b)
    }
}

/// Caller-supplied comparison, see [`eq_fn`].
#[derive(Debug, Clone, Copy)]
pub struct EqFn<F>(F);

/// Wrap a closure as an equality policy.
///
/// ```
/// use value_debouncer::{eq_fn, ValueEq};
///
/// let eq = eq_fn(|a: &String, b: &String| a.eq_ignore_ascii_case(b));
/// assert!(eq.same(&"Tokio".to_string(), &"tokio".to_string()));
/// ```
pub fn eq_fn<T, F>(f: F) -> EqFn<F>
where
    F: Fn(&T, &T) -> bool + Send + Sync + 'static,
{
    EqFn(f)
}

impl<T, F> ValueEq<T> for EqFn<F>
where
    F: Fn(&T, &T) -> bool + Send + Sync + 'static,
{
    fn same(&self, a: &T, b: &T) -> bool {
        (self.0)(a, b)
    }
}
