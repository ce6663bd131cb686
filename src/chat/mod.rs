// Chat threads behind a single access gateway: members authenticate with
// their user id, outsiders with a per-chat guest token issued once and
// never rotated.

pub mod access;
pub mod guest_links;
pub mod messages;
