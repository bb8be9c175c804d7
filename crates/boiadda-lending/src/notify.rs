//! User-facing notifications.
//!
//! Emission happens as a side effect of request decisions in
//! [`service`](crate::service); this module owns the message wording and the
//! recipient-facing operations (listing, marking read).

use boiadda_store::{Notification, NotificationKind};
use tracing::debug;

use crate::error::{LendingError, Result};
use crate::identity::Actor;
use crate::service::Lending;

/// The message shown to the recipient for a given decision.
pub(crate) fn message(kind: NotificationKind, book_title: &str) -> String {
    match kind {
        NotificationKind::BorrowApproved => {
            format!("আপনার \"{book_title}\" ধারের অনুরোধ অনুমোদিত হয়েছে।")
        }
        NotificationKind::BorrowRejected => {
            format!("আপনার \"{book_title}\" ধারের অনুরোধ প্রত্যাখ্যান করা হয়েছে।")
        }
        NotificationKind::DonationApproved => {
            format!("আপনার দান করা \"{book_title}\" লাইব্রেরিতে যুক্ত হয়েছে। ধন্যবাদ!")
        }
        NotificationKind::DonationRejected => {
            format!("আপনার \"{book_title}\" দানের অনুরোধ প্রত্যাখ্যান করা হয়েছে।")
        }
    }
}

impl Lending {
    /// The caller's own notifications, newest first.
    pub fn notifications_for(&self, actor: &Actor) -> Result<Vec<Notification>> {
        Ok(self.database()?.notifications_for_user(actor.id)?)
    }

    /// Mark one of the caller's notifications as read.
    ///
    /// Marking an already-read notification again is a successful no-op.
    pub fn mark_read(&self, actor: &Actor, notification_id: i64) -> Result<()> {
        let db = self.database()?;

        let notification = db.get_notification(notification_id)?;
        if notification.user_id != actor.id {
            return Err(LendingError::Forbidden(
                "notification belongs to another user".to_string(),
            ));
        }

        if !notification.read {
            db.mark_notification_read(notification_id)?;
            debug!(notification_id, user_id = actor.id, "notification marked read");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boiadda_store::{Database, NewUser, Role};

    fn setup() -> (Lending, Actor, Actor, i64) {
        let lending = Lending::new(Database::open_in_memory().unwrap());
        let (alice, bob, notification_id) = {
            let db = lending.database().unwrap();
            let alice = db
                .create_user(&NewUser {
                    name: "আলিসা".to_string(),
                    email: "alice@example.com".to_string(),
                    phone: None,
                    password_hash: "x".to_string(),
                    role: Role::User,
                })
                .unwrap();
            let bob = db
                .create_user(&NewUser {
                    name: "রাসেল".to_string(),
                    email: "bob@example.com".to_string(),
                    phone: None,
                    password_hash: "x".to_string(),
                    role: Role::User,
                })
                .unwrap();
            let n = db
                .insert_notification(
                    alice.id,
                    NotificationKind::BorrowApproved,
                    &message(NotificationKind::BorrowApproved, "হিমু"),
                )
                .unwrap();
            (alice.id, bob.id, n.id)
        };
        (
            lending,
            Actor::member(alice),
            Actor::member(bob),
            notification_id,
        )
    }

    #[test]
    fn only_the_owner_may_mark_read() {
        let (lending, alice, bob, notification_id) = setup();

        assert!(matches!(
            lending.mark_read(&bob, notification_id),
            Err(LendingError::Forbidden(_))
        ));

        lending.mark_read(&alice, notification_id).unwrap();
        assert!(lending.notifications_for(&alice).unwrap()[0].read);
    }

    #[test]
    fn marking_read_twice_is_a_no_op() {
        let (lending, alice, _, notification_id) = setup();

        lending.mark_read(&alice, notification_id).unwrap();
        lending.mark_read(&alice, notification_id).unwrap();

        let notifications = lending.notifications_for(&alice).unwrap();
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].read);
    }

    #[test]
    fn missing_notification_is_not_found() {
        let (lending, alice, _, _) = setup();
        assert!(matches!(
            lending.mark_read(&alice, 9999),
            Err(LendingError::NotFound)
        ));
    }
}
