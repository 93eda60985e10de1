//! HTML parsers for the race authority site.

pub mod race_detail;
pub mod race_list;

pub use race_detail::{HorseEntry, RaceDetail, RaceDetailParser};
pub use race_list::{RaceListItem, RaceListParser};
