#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Build a [`Cut`](crate::Cut) from a name and optional infallible closures.
///
/// ```
/// use cutflow::cut;
///
/// let base = cut! { name: "base" };
/// let even = cut! { name: "even", eval: || 4 % 2 == 0 };
/// let scaled = cut! { name: "scaled", eval: || true, weight: || 0.5 };
/// assert_eq!(scaled.name(), "scaled");
/// # let _ = (base, even);
/// ```
#[macro_export]
macro_rules! cut {
    (name: $name:expr $(,)?) => {
        $crate::Cut::new($name)
    };
    (name: $name:expr, eval: $eval:expr $(,)?) => {
        $crate::Cut::predicate($name, $eval)
    };
    (name: $name:expr, eval: $eval:expr, weight: $weight:expr $(,)?) => {
        $crate::Cut::weighted($name, $eval, $weight)
    };
    (name: $name:expr, weight: $weight:expr $(,)?) => {
        $crate::Cut::new($name).with_weight($weight)
    };
}
