//! HTTP clients for the gateway's two upstream systems.
//!
//! [`PanelApi`] speaks the de-facto "SMM panel v2" protocol: every call is a form-encoded POST to a single
//! endpoint carrying the API key and an `action` field, answered with JSON whose field types vary from panel
//! to panel. The wire types in [`data_objects`] keep those fields loose (`serde_json::Value`) and expose
//! canonicalizing accessors built on the [`helpers`] coercions, so the rest of the workspace never handles a
//! "boolean" that is actually the string `"yes"`.
//!
//! [`FxApi`] fetches USD exchange rates from an open.er-api.com-compatible source. It exists because some
//! panels quote rates in their local currency while wallets are priced in another.

mod api;
mod config;
mod error;
mod fx;

mod data_objects;
mod helpers;

pub use api::{PanelApi, PANEL_CLIENT_TIMEOUT};
pub use config::{PanelConfig, DEFAULT_PANEL_URL};
pub use data_objects::{AddOrderResult, PanelStatusRecord, RawPanelService};
pub use error::PanelApiError;
pub use fx::{FxApi, DEFAULT_FX_URL, FX_CLIENT_TIMEOUT};
pub use helpers::{coerce_bool, coerce_f64, coerce_i64};
