pub mod relay;

pub use relay::{RelayOutcome, handle_relay, relay};
