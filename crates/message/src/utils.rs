//! Utility macros shared by the parsers of this crate.

/// Returns early with `$error` when `$predicate` does not hold.
///
/// Works like `assert!` but produces an `Err` instead of panicking, which keeps the
/// parsers total over arbitrary input.
///
/// ```ignore
/// ensure!(head.ends_with("\r\n"), ParseError::invalid_message("status line"));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
