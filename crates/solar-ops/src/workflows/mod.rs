pub mod dispatch;
pub mod roster;
