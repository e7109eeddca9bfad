use std::collections::HashMap;

use regex::Regex;
use tracing::{info, instrument};

use crate::config::ClubConfig;
use crate::extractor::RegexLineParser;
use crate::model::{MatchKey, TicketBlock};

/// Anchor text that marks a ticket-purchase link.
pub const TICKET_LINK_PATTERN: &str = r"(?i)(купить билеты|Купить|Билеты)";

/// Characters allowed in an opponent name on the tickets page.
const OPPONENT_CHARS: &str = r"[A-Za-zА-Яа-яёЁ0-9.\- ]+";

/// Maps ticket blocks scraped from the tickets page to match keys.
#[derive(Clone, Debug)]
pub struct TicketCorrelator {
    opponent: Regex,
    call_to_action: Regex,
    when: RegexLineParser,
}

impl TicketCorrelator {
    pub fn for_club(club: &ClubConfig) -> Result<Self, regex::Error> {
        let opponent = Regex::new(&format!(
            r"(?i){}\s*(?:vs|—|-|:)\s*({})",
            regex::escape(club.name.trim()),
            OPPONENT_CHARS
        ))?;
        Ok(Self {
            opponent,
            call_to_action: Regex::new(TICKET_LINK_PATTERN)?,
            when: RegexLineParser::new()?,
        })
    }

    /// Build the key → ticket URL map. Blocks missing an opponent, date or time
    /// are skipped; on duplicate keys the later block wins.
    #[instrument(level = "info", skip(self, blocks), fields(blocks = blocks.len()))]
    pub fn correlate(&self, blocks: &[TicketBlock]) -> HashMap<MatchKey, String> {
        let mut map: HashMap<MatchKey, String> = HashMap::new();
        for block in blocks {
            if let Some(key) = self.key_for_text(&block.block_text) {
                map.insert(key, block.href.clone());
            }
        }
        info!(tickets = map.len(), "Correlated ticket links");
        map
    }

    /// Match key for one block of ticket-page text, if it names a home match.
    pub fn key_for_text(&self, text: &str) -> Option<MatchKey> {
        let opponent_raw = self.opponent.captures(text)?.get(1)?.as_str();
        let (day, month, _) = self.when.find_date(text)?;
        let (hour, minute, _) = self.when.find_time(text)?;

        let opponent = self.cut_trailing_noise(opponent_raw);
        if opponent.trim().is_empty() {
            return None;
        }
        Some(MatchKey::home(month, day, hour, minute, opponent))
    }

    // The opponent character class also accepts digits, dots and spaces, so a
    // greedy capture runs on into "12.04 19" or "Купить билеты".
    fn cut_trailing_noise<'t>(&self, captured: &'t str) -> &'t str {
        let cut = [
            self.when.find_date(captured).map(|(_, _, span)| span.start),
            self.when.find_time(captured).map(|(_, _, span)| span.start),
            self.call_to_action.find(captured).map(|m| m.start()),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(captured.len());
        &captured[..cut]
    }
}
