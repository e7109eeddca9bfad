pub mod fixture;
pub mod match_key;
pub mod ticket;

pub use fixture::Fixture;
pub use match_key::MatchKey;
pub use ticket::TicketBlock;
