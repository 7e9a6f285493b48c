//! Adapters between the `panel_tools` HTTP clients and the engine's traits.
//!
//! This is the one place the panel's loose wire types are coerced into the engine's canonical shapes; past
//! this boundary nothing ever sees a "boolean" that is really the string `"yes"`.

mod fx;
mod panel;

pub use fx::RateClient;
pub use panel::PanelClient;
