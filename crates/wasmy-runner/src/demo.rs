//! The sample host function shipped with wasmy.

use wasmy_types::{Args, Payload};

use crate::host::{HostError, HostFunctions};

/// Name the sample guest imports it under (`env.main.PrintHello`).
pub const PRINT_HELLO: &str = "PrintHello";

/// Greets the name passed as the first argument.
pub fn print_hello(args: &Args) -> Result<Payload, HostError> {
    let name = args.str_at(0)?;
    Ok(Payload::new(format!("From Host: Hello Mr. {name}")))
}

/// A registry holding only [`print_hello`].
pub fn demo_functions() -> HostFunctions {
    HostFunctions::new().with(PRINT_HELLO, print_hello)
}
