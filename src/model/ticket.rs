use serde::{Deserialize, Serialize};

/// A ticket link together with the text of the page block surrounding it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketBlock {
    pub href: String,
    pub block_text: String,
}

impl TicketBlock {
    pub fn new(href: impl Into<String>, block_text: impl Into<String>) -> Self {
        Self { href: href.into(), block_text: block_text.into() }
    }
}
