//! Client version.

/// The short version information for the enveloping client.
pub const ENVELOPING_SHORT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The long version information for the enveloping client.
pub const ENVELOPING_LONG_VERSION: &str = concat!(
    "Version: ",
    env!("CARGO_PKG_VERSION"),
    "\n",
    "Package: ",
    env!("CARGO_PKG_NAME")
);
