pub use super::access_key::Entity as AccessKey;
pub use super::entry::Entity as Entry;
pub use super::meta::Entity as Meta;
pub use super::referee::Entity as Referee;
pub use super::roster_item::Entity as RosterItem;
pub use super::sub_event::Entity as SubEvent;
