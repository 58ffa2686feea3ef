pub mod expiry;

pub use expiry::{next_weekly_expiry, parse_weekday, week_monday, weekday_name, weekly_expiries, ExpiryCalendar};
