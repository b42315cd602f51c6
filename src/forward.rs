//! Forwarding helpers for the proxies
//!
//! Most capability methods are plain pass-throughs. These macros generate
//! them from a signature list so the proxies only spell out the methods that
//! log something. They only produce synchronous methods: `async_trait`
//! rewrites `async fn` items before macros inside the impl are expanded.
//!
//! The receiver path (`inner`, `shared.inner`) is captured once as a single
//! token tree so it can be reused inside the per-method repetition.

/// Forward `&self` methods to `self.<path>`
macro_rules! forward_ref {
    (@go $path:tt $(fn $name:ident(&self $(, $arg:ident: $ty:ty)*) -> $ret:ty;)*) => {
        $(
            fn $name(&self $(, $arg: $ty)*) -> ::std::result::Result<$ret, Self::Error> {
                forward_call!(self $path $name($($arg),*))
            }
        )*
    };
    ($($field:ident).+ => $($rest:tt)*) => {
        forward_ref!(@go ($($field).+) $($rest)*);
    };
}

/// Forward `&mut self` methods to `self.<path>`
macro_rules! forward_mut {
    (@go $path:tt $(fn $name:ident(&mut self $(, $arg:ident: $ty:ty)*) -> $ret:ty;)*) => {
        $(
            fn $name(&mut self $(, $arg: $ty)*) -> ::std::result::Result<$ret, Self::Error> {
                forward_call!(self $path $name($($arg),*))
            }
        )*
    };
    ($($field:ident).+ => $($rest:tt)*) => {
        forward_mut!(@go ($($field).+) $($rest)*);
    };
}

/// `receiver.<path>.method(args)`
macro_rules! forward_call {
    ($receiver:ident ($($field:ident).+) $name:ident($($arg:ident),*)) => {
        $receiver.$($field).+.$name($($arg),*)
    };
}
