//! Formatting shorthands for the entry points. The message template is
//! resolved eagerly with `format!`.

/// `new_err!(code, "fmt", args..)`: a new one-frame stack.
#[macro_export]
macro_rules! new_err {
    ($code:expr, $($arg:tt)+) => {
        $crate::new($code, format!($($arg)+))
    };
}

/// `wrap_err!(err, code, "fmt", args..)`: wrap `err` with a new frame.
#[macro_export]
macro_rules! wrap_err {
    ($err:expr, $code:expr, $($arg:tt)+) => {
        $crate::wrap($err, $code, format!($($arg)+))
    };
}
