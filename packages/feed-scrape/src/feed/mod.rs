//! Feed item synthesis.
//!
//! Turns extracted records into [`FeedItem`]s with stable GUIDs,
//! strictly ordered timestamps and escaped HTML descriptions.

mod description;
mod synthesizer;
mod types;

pub use description::{DescriptionTemplate, Part, PartStyle, Section};
pub use synthesizer::{
    render_title, EnclosureRule, FeedSynthesizer, ItemMode, ItemTemplate,
    DEFAULT_ITEM_INTERVAL_SECS,
};
pub use types::{Feed, FeedItem};
