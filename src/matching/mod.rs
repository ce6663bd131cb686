// Swipe-based matching: the append-only swipe ledger, the candidate feed
// and mutual-like detection that opens a chat for each new match.

pub mod detector;
pub mod feed;
pub mod ledger;
pub mod matches;
