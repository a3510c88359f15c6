pub mod error;
pub mod jsonld;
pub mod render;

pub use error::FeedError;
pub use jsonld::{to_json_ld, Availability, FeedSettings, JsonLdOffer, JsonLdProduct};
pub use render::{inject_script, json_ld_script, load_template, render_feed, JSON_LD_PLACEHOLDER};
