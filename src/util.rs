//! Various utilities.

use failure::{format_err, Error, Fallible};
use futures::{future::poll_fn, Async, Future};
use log::error;

/// Logs an error, including its causes and backtrace (if possible).
pub fn log_err(err: &Error) {
    let mut first = true;
    let num_errs = err.iter_chain().count();
    if num_errs <= 1 {
        error!("{}", err);
    } else {
        for cause in err.iter_chain() {
            if first {
                first = false;
                error!("           {}", cause);
            } else {
                error!("caused by: {}", cause);
            }
        }
    }
    let bt = err.backtrace().to_string();
    if bt != "" {
        error!("{}", bt);
    }
}

/// Runs a blocking function on the current `tokio_threadpool`, letting the pool spin up another
/// worker so the rest of the server isn't stalled. Must be polled from inside the threadpool.
pub fn blocking<F, T>(func: F) -> impl Future<Item = T, Error = Error>
where
    F: FnOnce() -> Fallible<T>,
{
    let mut func = Some(func);
    poll_fn(move || {
        let r = tokio_threadpool::blocking(|| match func.take() {
            Some(func) => func(),
            None => Err(format_err!("blocking call polled after it completed")),
        });
        match r {
            Ok(Async::Ready(r)) => r.map(Async::Ready),
            Ok(Async::NotReady) => Ok(Async::NotReady),
            Err(err) => Err(err.into()),
        }
    })
}

/// The type of a responder. Since `impl Trait` can't be used in `type` items, this magics one up.
macro_rules! Resp {
    () => { warp::filters::BoxedFilter<(impl warp::Reply,)> };
}

/// Inserts `.or(...)` between the given filters, prefixing each with its method and path.
macro_rules! route_any {
    ($hm:ident $hp:tt => $h:expr $(, $tm:ident $tp:tt => $t:expr)* $(,)*) => {
        route_any!(@internal @path $hm $hp).and($h)
            $(.or(route_any!(@internal @path $tm $tp).and($t)))*
    };

    (@internal @path GET ()) => {{ warp::get2() }};
    (@internal @path POST ()) => {{ warp::post2() }};
    (@internal @path PUT ()) => {{ warp::put2() }};
    (@internal @path PATCH ()) => {{ warp::patch() }};
    (@internal @path DELETE ()) => {{ warp::delete2() }};
    (@internal @path $m:ident $p:tt) => {{
        use warp::path;
        route_any!(@internal @path $m ()).and(path! $p)
    }};
}

/// Defines a closed set of values with fixed spellings, along with `Display`, `FromStr`, and
/// `Serialize` impls that use those spellings.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $text:literal),* $(,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub enum $name {
            $(
                #[doc = $text]
                $variant,
            )*
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            /// The canonical spelling of this value.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, fmt: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                fmt.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::failure::Error;

            fn from_str(s: &str) -> Result<$name, ::failure::Error> {
                $name::ALL
                    .iter()
                    .cloned()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| {
                        ::failure::format_err!("{:?} is not a valid {}", s, stringify!($name))
                    })
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}
