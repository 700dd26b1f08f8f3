pub mod prelude;

pub mod access_key;
pub mod entry;
pub mod meta;
pub mod referee;
pub mod roster_item;
pub mod sub_event;
