// Messaging - Observable effects pushed out to collaborators
// Lock-free: the sequencer never waits on whoever reads notifications

pub mod channels;
pub mod notification;

pub use channels::{NotificationConsumer, NotificationProducer, create_notification_channel};
pub use notification::{Notification, NotificationKind, NotificationLevel};
