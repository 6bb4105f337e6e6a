//! Server-side SDK for the [Woopra](https://www.woopra.com) web-analytics
//! service.
//!
//! The tracker buffers `config`/`identify`/`track` calls and renders them
//! into the Woopra page snippet, or fires them straight at Woopra's
//! tracking endpoints as HTTP GET beacons when no browser is involved.
//!
//! ```rust,no_run
//! use woopra::{Event, WoopraTracker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), woopra::TrackerError> {
//!     let mut tracker = WoopraTracker::new()?;
//!     tracker.config(
//!         serde_json::json!({ "domain": "ralphsamuel.io" })
//!             .as_object()
//!             .expect("object literal"),
//!     );
//!
//!     // back-end beacon, fire-and-forget
//!     tracker
//!         .track_backend(&Event::named("play").with("title", "TITLE"), None)
//!         .await;
//!
//!     // or render the front-end snippet into a page
//!     let html = tracker.woopra_code();
//!     println!("{html}");
//!     Ok(())
//! }
//! ```

mod beacon;
mod config;
mod cookie;
mod error;
mod event;
mod snippet;
mod tracker;

pub use beacon::{BeaconClient, TRACK_BASE_URL};
pub use config::TrackerConfig;
pub use cookie::{random_cookie_value, set_cookie_header};
pub use error::TrackerError;
pub use event::{Event, EventMeta};
pub use tracker::WoopraTracker;
