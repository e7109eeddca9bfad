use std::collections::HashMap;

use chrono::{TimeZone, Utc};

use loko_fixtures::config::ClubConfig;
use loko_fixtures::extractor::FixtureExtractor;
use loko_fixtures::merge::{attach_tickets, match_key_for};
use loko_fixtures::model::{MatchKey, TicketBlock};
use loko_fixtures::tickets::TicketCorrelator;

fn correlator() -> TicketCorrelator {
    TicketCorrelator::for_club(&ClubConfig::default()).expect("correlator patterns compile")
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

#[test]
fn builds_padded_key_from_ticket_block() {
    let blocks = vec![TicketBlock::new("https://x/y", "Локомотив vs Спартак 12.04 19:00 Купить билеты")];
    let map = correlator().correlate(&blocks);

    assert_eq!(map.len(), 1);
    let (key, url) = map.iter().next().unwrap();
    assert_eq!(key.as_str(), "home:04-12 19:00 спартак");
    assert_eq!(url, "https://x/y");
}

#[test]
fn pads_single_digit_components() {
    let key = correlator().key_for_text("Локомотив - Ахмат 3.9 9:05 Купить").unwrap();
    assert_eq!(key.to_string(), "home:09-03 09:05 ахмат");
}

#[test]
fn opponent_stops_at_line_break_and_is_normalized() {
    let key = correlator()
        .key_for_text("ЛОКОМОТИВ —   СПАРТАК   Москва\n12.04 19:00\nКупить билеты")
        .unwrap();
    assert_eq!(key.as_str(), "home:04-12 19:00 спартак москва");
}

#[test]
fn opponent_stops_before_call_to_action() {
    let key = correlator()
        .key_for_text("Локомотив : Пари НН Купить билеты 22.11 17:00")
        .unwrap();
    assert_eq!(key.as_str(), "home:11-22 17:00 пари нн");
}

#[test]
fn skips_blocks_missing_opponent_date_or_time() {
    let blocks = vec![
        TicketBlock::new("https://x/1", "Спартак 12.04 19:00 Купить билеты"),
        TicketBlock::new("https://x/2", "Локомотив — Спартак 19:00 Купить билеты"),
        TicketBlock::new("https://x/3", "Локомотив — Спартак 12.04 Купить билеты"),
        TicketBlock::new("https://x/4", "Зенит — Локомотив 05.05 20:30 Купить билеты"),
    ];
    assert!(correlator().correlate(&blocks).is_empty());
}

#[test]
fn later_block_wins_on_duplicate_key() {
    let blocks = vec![
        TicketBlock::new("https://x/first", "Локомотив vs Спартак 12.04 19:00 Купить"),
        TicketBlock::new("https://x/second", "Локомотив vs  спартак 12.04 19:00 Билеты"),
    ];
    let map = correlator().correlate(&blocks);

    assert_eq!(map.len(), 1);
    assert_eq!(map.values().next().unwrap(), "https://x/second");
}

#[test]
fn fixture_and_ticket_keys_are_identical() {
    let club = ClubConfig::default();
    let extractor = FixtureExtractor::for_club(club.clone()).unwrap();
    let fixtures = extractor.extract(&["12.04 19:00 Локомотив — Спартак  Москва"], now());

    let from_fixture = match_key_for(&fixtures[0], &club).unwrap();
    let from_ticket = correlator()
        .key_for_text("локомотив vs СПАРТАК МОСКВА 12.04 19:00 Купить билеты")
        .unwrap();
    assert_eq!(from_fixture, from_ticket);
}

#[test]
fn attaches_ticket_url_to_matching_home_fixture() {
    let club = ClubConfig::default();
    let extractor = FixtureExtractor::for_club(club.clone()).unwrap();
    let mut fixtures = extractor.extract(
        &["12.04 19:00 Локомотив — Спартак", "20.04 19:00 Локомотив — Рубин"],
        now(),
    );
    let tickets = correlator().correlate(&[TicketBlock::new(
        "https://x/y",
        "Локомотив vs Спартак 12.04 19:00 Купить билеты",
    )]);

    let attached = attach_tickets(&mut fixtures, &tickets, &club);

    assert_eq!(attached, 1);
    assert_eq!(fixtures[0].ticket_url.as_deref(), Some("https://x/y"));
    // No ticket block for this one; left alone
    assert_eq!(fixtures[1].ticket_url, None);
}

#[test]
fn away_fixture_never_gets_a_ticket() {
    let club = ClubConfig::default();
    let extractor = FixtureExtractor::for_club(club.clone()).unwrap();
    let mut fixtures = extractor.extract(&["05.05 20:30 Зенит — Локомотив"], now());
    assert!(match_key_for(&fixtures[0], &club).is_none());

    // Every key an away game could plausibly produce
    let mut tickets: HashMap<MatchKey, String> = HashMap::new();
    for opponent in ["зенит", "зенит — локомотив", "Зенит — Локомотив"] {
        tickets.insert(MatchKey::home(5, 5, 20, 30, opponent), "https://x/away".to_string());
    }

    let attached = attach_tickets(&mut fixtures, &tickets, &club);

    assert_eq!(attached, 0);
    assert_eq!(fixtures[0].ticket_url, None);
}

#[test]
fn ticket_url_is_serialized_when_present() {
    let club = ClubConfig::default();
    let extractor = FixtureExtractor::for_club(club.clone()).unwrap();
    let mut fixtures = extractor.extract(&["12.04 19:00 Локомотив — Спартак"], now());
    let tickets = correlator().correlate(&[TicketBlock::new("https://x/y", "Локомотив vs Спартак 12.04 19:00 Купить билеты")]);
    attach_tickets(&mut fixtures, &tickets, &club);

    let json = serde_json::to_value(&fixtures[0]).unwrap();
    assert_eq!(json["ticketUrl"], "https://x/y");
}

#[test]
fn comma_separated_schedule_line_still_gets_its_ticket() {
    let club = ClubConfig::default();
    let extractor = FixtureExtractor::for_club(club.clone()).unwrap();
    let mut fixtures = extractor.extract(&["Локомотив — Спартак, 12.04, 19:00"], now());
    let tickets = correlator().correlate(&[TicketBlock::new(
        "https://x/y",
        "Локомотив vs Спартак 12.04 19:00 Купить билеты",
    )]);

    let attached = attach_tickets(&mut fixtures, &tickets, &club);

    assert_eq!(attached, 1);
    assert_eq!(fixtures[0].ticket_url.as_deref(), Some("https://x/y"));
}
