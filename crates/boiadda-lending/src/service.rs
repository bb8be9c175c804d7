//! The approval workflow: request creation, admin decisions, returns.
//!
//! All mutations go through one [`Mutex`] around the database handle, so
//! every request and every copy has a single logical owner at a time.  The
//! store's guarded UPDATEs back this up: even with another writer on the same
//! database file, a pending request transitions at most once and the last
//! copy of a book goes to exactly one borrower.

use std::sync::{Mutex, MutexGuard};

use chrono::Duration;
use tracing::info;
use uuid::Uuid;

use boiadda_store::{
    Book, BorrowRequest, Database, DonationRequest, NewBook, NotificationKind, RequestKind,
    RequestStatus,
};

use crate::error::{LendingError, Result};
use crate::identity::Actor;
use crate::notify;

/// Loan period used when none is configured.
pub const DEFAULT_LOAN_PERIOD_DAYS: i64 = 14;

/// Donation payload for a title that is not yet in the catalog.
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub cover_img: Option<String>,
    /// Defaults to the general category when empty.
    pub category: Option<String>,
}

/// The lending workflow service.
pub struct Lending {
    db: Mutex<Database>,
    loan_period: Duration,
}

impl Lending {
    /// Wrap a database with the default 14-day loan period.
    pub fn new(db: Database) -> Self {
        Self::with_loan_period(db, DEFAULT_LOAN_PERIOD_DAYS)
    }

    /// Wrap a database with an explicit loan period.
    pub fn with_loan_period(db: Database, loan_period_days: i64) -> Self {
        Self {
            db: Mutex::new(db),
            loan_period: Duration::days(loan_period_days),
        }
    }

    pub fn loan_period_days(&self) -> i64 {
        self.loan_period.num_days()
    }

    /// Lock the underlying database.
    ///
    /// The API layer uses this for plain read queries (catalog, history,
    /// statistics).  All workflow mutations stay inside this crate.
    pub fn database(&self) -> Result<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| LendingError::LockPoisoned)
    }

    // ------------------------------------------------------------------
    // Request creation
    // ------------------------------------------------------------------

    /// Submit a borrow request for one copy of a book.
    ///
    /// The request does not reserve a copy; contention for inventory happens
    /// at approval time.  Creation fails with [`LendingError::BookUnavailable`]
    /// only when the shelf is already empty, and with
    /// [`LendingError::Duplicate`] when the member already holds the book or
    /// has a pending request for it.
    pub fn create_borrow_request(&self, actor: &Actor, book_id: i64) -> Result<BorrowRequest> {
        let db = self.database()?;
        db.get_book(book_id)?;

        if db.has_active_borrow(actor.id, book_id)? {
            return Err(LendingError::Duplicate(
                "You already have a copy of this book borrowed.".to_string(),
            ));
        }
        if db.has_pending_borrow(actor.id, book_id)? {
            return Err(LendingError::Duplicate(
                "You already have a pending borrow request for this book.".to_string(),
            ));
        }
        if db.available_copy_count(book_id)? == 0 {
            return Err(LendingError::BookUnavailable);
        }

        let request = db.insert_borrow_request(actor.id, book_id)?;
        info!(
            request_id = request.id,
            user_id = actor.id,
            book_id,
            "borrow request created"
        );
        Ok(request)
    }

    /// Donate a title that is not in the catalog yet.
    ///
    /// The book row is created immediately (with the donor recorded); the
    /// physical copy only appears on the shelf once an admin approves the
    /// pending donation request.
    pub fn create_donation_request(
        &self,
        actor: &Actor,
        donation: NewDonation,
    ) -> Result<(Book, DonationRequest)> {
        let title = donation.title.trim();
        let author = donation.author.trim();
        if title.is_empty() {
            return Err(LendingError::Validation("title must not be empty".to_string()));
        }
        if author.is_empty() {
            return Err(LendingError::Validation("author must not be empty".to_string()));
        }

        let category = donation
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or("সাধারণ")
            .to_string();

        let db = self.database()?;
        let book = db.create_book(&NewBook {
            title: title.to_string(),
            author: author.to_string(),
            isbn: donated_isbn(),
            description: donation.description,
            category,
            cover_img: donation.cover_img,
            donor_id: Some(actor.id),
        })?;
        let request = db.insert_donation_request(actor.id, book.id)?;

        info!(
            request_id = request.id,
            user_id = actor.id,
            book_id = book.id,
            title = %book.title,
            "donation request created"
        );
        Ok((book, request))
    }

    /// Donate one more copy of a title already in the catalog.
    pub fn donate_existing_book(&self, actor: &Actor, book_id: i64) -> Result<DonationRequest> {
        let db = self.database()?;
        db.get_book(book_id)?;

        let request = db.insert_donation_request(actor.id, book_id)?;
        info!(
            request_id = request.id,
            user_id = actor.id,
            book_id,
            "donation request created for existing title"
        );
        Ok(request)
    }

    // ------------------------------------------------------------------
    // Review queues
    // ------------------------------------------------------------------

    /// Pending borrow requests, oldest first.
    pub fn pending_borrow_requests(&self) -> Result<Vec<BorrowRequest>> {
        Ok(self.database()?.pending_borrow_requests()?)
    }

    /// Pending donation requests, oldest first.
    pub fn pending_donation_requests(&self) -> Result<Vec<DonationRequest>> {
        Ok(self.database()?.pending_donation_requests()?)
    }

    // ------------------------------------------------------------------
    // Decisions
    // ------------------------------------------------------------------

    /// Approve a pending request.  Admin only; transitions the request at
    /// most once and applies the inventory effect for its kind.
    pub fn approve(
        &self,
        actor: &Actor,
        kind: RequestKind,
        request_id: i64,
        comment: Option<String>,
    ) -> Result<()> {
        require_admin(actor)?;
        match kind {
            RequestKind::Borrow => self.approve_borrow(actor, request_id, comment),
            RequestKind::Donation => self.approve_donation(actor, request_id, comment),
        }
    }

    /// Reject a pending request.  Admin only; never touches inventory.
    pub fn reject(
        &self,
        actor: &Actor,
        kind: RequestKind,
        request_id: i64,
        comment: Option<String>,
    ) -> Result<()> {
        require_admin(actor)?;
        let db = self.database()?;
        let now = chrono::Utc::now();

        let (user_id, book_id, notification) = match kind {
            RequestKind::Borrow => {
                let request = db.get_borrow_request(request_id)?;
                if request.status != RequestStatus::Pending {
                    return Err(LendingError::InvalidState);
                }
                if !db.reject_borrow_request(request_id, actor.id, comment.as_deref(), now)? {
                    return Err(LendingError::InvalidState);
                }
                (request.user_id, request.book_id, NotificationKind::BorrowRejected)
            }
            RequestKind::Donation => {
                let request = db.get_donation_request(request_id)?;
                if request.status != RequestStatus::Pending {
                    return Err(LendingError::InvalidState);
                }
                if !db.reject_donation_request(request_id, actor.id, comment.as_deref(), now)? {
                    return Err(LendingError::InvalidState);
                }
                (request.user_id, request.book_id, NotificationKind::DonationRejected)
            }
        };

        let book = db.get_book(book_id)?;
        db.insert_notification(user_id, notification, &notify::message(notification, &book.title))?;

        info!(
            request_id,
            admin_id = actor.id,
            kind = kind.as_str(),
            "request rejected"
        );
        Ok(())
    }

    fn approve_borrow(&self, actor: &Actor, request_id: i64, comment: Option<String>) -> Result<()> {
        let db = self.database()?;

        let request = db.get_borrow_request(request_id)?;
        if request.status != RequestStatus::Pending {
            return Err(LendingError::InvalidState);
        }
        let book = db.get_book(request.book_id)?;

        // Inventory contention is decided here: the claim is the only thing
        // that can still fail, and a failed claim leaves the request pending.
        let Some(copy_id) = db.claim_available_copy(request.book_id, request.user_id)? else {
            return Err(LendingError::BookUnavailable);
        };

        let now = chrono::Utc::now();
        let due_date = now + self.loan_period;
        let flipped = db.approve_borrow_request(
            request_id,
            copy_id,
            actor.id,
            comment.as_deref(),
            due_date,
            now,
        )?;
        if !flipped {
            // Transition lost to a concurrent decider; undo the copy claim.
            db.release_copy(copy_id)?;
            return Err(LendingError::InvalidState);
        }

        db.insert_notification(
            request.user_id,
            NotificationKind::BorrowApproved,
            &notify::message(NotificationKind::BorrowApproved, &book.title),
        )?;

        info!(
            request_id,
            admin_id = actor.id,
            copy_id,
            due_date = %due_date,
            "borrow request approved"
        );
        Ok(())
    }

    fn approve_donation(
        &self,
        actor: &Actor,
        request_id: i64,
        comment: Option<String>,
    ) -> Result<()> {
        let db = self.database()?;

        let request = db.get_donation_request(request_id)?;
        if request.status != RequestStatus::Pending {
            return Err(LendingError::InvalidState);
        }
        let book = db.get_book(request.book_id)?;

        let now = chrono::Utc::now();
        let flipped =
            db.approve_donation_request(request_id, actor.id, comment.as_deref(), now)?;
        if !flipped {
            return Err(LendingError::InvalidState);
        }

        // The donated physical copy goes on the shelf.
        let copy = db.add_copy(request.book_id)?;

        db.insert_notification(
            request.user_id,
            NotificationKind::DonationApproved,
            &notify::message(NotificationKind::DonationApproved, &book.title),
        )?;

        info!(
            request_id,
            admin_id = actor.id,
            copy_id = copy.id,
            "donation request approved"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Returns
    // ------------------------------------------------------------------

    /// Return a borrowed copy.  Only the borrowing member, on their own
    /// approved and unreturned loan of exactly that copy.
    pub fn return_book(&self, actor: &Actor, copy_id: i64) -> Result<BorrowRequest> {
        let db = self.database()?;

        let request = db
            .active_borrow_for_copy(actor.id, copy_id)?
            .ok_or(LendingError::NotFound)?;

        let now = chrono::Utc::now();
        if !db.mark_returned(request.id, now)? {
            return Err(LendingError::InvalidState);
        }
        db.release_copy(copy_id)?;

        info!(
            request_id = request.id,
            user_id = actor.id,
            copy_id,
            "book returned"
        );
        db.get_borrow_request(request.id).map_err(Into::into)
    }
}

fn require_admin(actor: &Actor) -> Result<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(LendingError::Forbidden("admin role required".to_string()))
    }
}

/// Synthetic ISBN for donated titles without one.
fn donated_isbn() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("DONATED-{}", uuid[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use boiadda_store::{NewUser, Role};

    fn service() -> Lending {
        Lending::new(Database::open_in_memory().unwrap())
    }

    fn add_user(lending: &Lending, email: &str, role: Role) -> Actor {
        let user = lending
            .database()
            .unwrap()
            .create_user(&NewUser {
                name: email.to_string(),
                email: email.to_string(),
                phone: None,
                password_hash: "x".to_string(),
                role,
            })
            .unwrap();
        Actor {
            id: user.id,
            role,
        }
    }

    fn add_book(lending: &Lending, title: &str, copies: u32) -> i64 {
        let db = lending.database().unwrap();
        let book = db
            .create_book(&NewBook {
                title: title.to_string(),
                author: "হুমায়ূন আহমেদ".to_string(),
                isbn: "9789848000002".to_string(),
                description: None,
                category: "উপন্যাস".to_string(),
                cover_img: None,
                donor_id: None,
            })
            .unwrap();
        for _ in 0..copies {
            db.add_copy(book.id).unwrap();
        }
        book.id
    }

    #[test]
    fn full_borrow_lifecycle() {
        let lending = service();
        let admin = add_user(&lending, "admin@example.com", Role::Admin);
        let member = add_user(&lending, "member@example.com", Role::User);
        let book_id = add_book(&lending, "হিমু", 1);

        let request = lending.create_borrow_request(&member, book_id).unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.due_date.is_none());

        lending
            .approve(&admin, RequestKind::Borrow, request.id, Some("ঠিক আছে".to_string()))
            .unwrap();

        let (stored, available, notifications) = {
            let db = lending.database().unwrap();
            (
                db.get_borrow_request(request.id).unwrap(),
                db.available_copy_count(book_id).unwrap(),
                db.notifications_for_user(member.id).unwrap(),
            )
        };
        assert_eq!(stored.status, RequestStatus::Approved);
        assert_eq!(stored.admin_id, Some(admin.id));
        assert_eq!(available, 0);

        // Due date is stamped at approval: decision time plus the loan period.
        let due = stored.due_date.unwrap();
        let decided = stored.decided_at.unwrap();
        assert_eq!(due - decided, Duration::days(DEFAULT_LOAN_PERIOD_DAYS));

        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::BorrowApproved);
        assert!(!notifications[0].read);

        // Return restores the shelf.
        let returned = lending.return_book(&member, stored.copy_id.unwrap()).unwrap();
        assert!(returned.returned_at.is_some());
        assert_eq!(
            lending.database().unwrap().available_copy_count(book_id).unwrap(),
            1
        );
    }

    #[test]
    fn approval_requires_admin_role() {
        let lending = service();
        let member = add_user(&lending, "member@example.com", Role::User);
        let book_id = add_book(&lending, "হিমু", 1);

        let request = lending.create_borrow_request(&member, book_id).unwrap();
        let err = lending
            .approve(&member, RequestKind::Borrow, request.id, None)
            .unwrap_err();
        assert!(matches!(err, LendingError::Forbidden(_)));

        let stored = lending
            .database()
            .unwrap()
            .get_borrow_request(request.id)
            .unwrap();
        assert_eq!(stored.status, RequestStatus::Pending);
    }

    #[test]
    fn second_transition_always_fails() {
        let lending = service();
        let admin = add_user(&lending, "admin@example.com", Role::Admin);
        let member = add_user(&lending, "member@example.com", Role::User);
        let book_id = add_book(&lending, "হিমু", 2);

        let request = lending.create_borrow_request(&member, book_id).unwrap();
        lending
            .approve(&admin, RequestKind::Borrow, request.id, None)
            .unwrap();

        assert!(matches!(
            lending.approve(&admin, RequestKind::Borrow, request.id, None),
            Err(LendingError::InvalidState)
        ));
        assert!(matches!(
            lending.reject(&admin, RequestKind::Borrow, request.id, None),
            Err(LendingError::InvalidState)
        ));
    }

    #[test]
    fn reject_twice_fails_the_second_time() {
        let lending = service();
        let admin = add_user(&lending, "admin@example.com", Role::Admin);
        let member = add_user(&lending, "member@example.com", Role::User);
        let book_id = add_book(&lending, "হিমু", 1);

        let request = lending.create_borrow_request(&member, book_id).unwrap();
        lending
            .reject(&admin, RequestKind::Borrow, request.id, Some("এখন নয়".to_string()))
            .unwrap();
        assert!(matches!(
            lending.reject(&admin, RequestKind::Borrow, request.id, None),
            Err(LendingError::InvalidState)
        ));
    }

    #[test]
    fn last_copy_has_exactly_one_winner() {
        let lending = service();
        let admin = add_user(&lending, "admin@example.com", Role::Admin);
        let alice = add_user(&lending, "alice@example.com", Role::User);
        let bob = add_user(&lending, "bob@example.com", Role::User);
        let book_id = add_book(&lending, "হিমু", 1);

        // Both requests are accepted while pending; only approval contends.
        let first = lending.create_borrow_request(&alice, book_id).unwrap();
        let second = lending.create_borrow_request(&bob, book_id).unwrap();

        lending
            .approve(&admin, RequestKind::Borrow, first.id, None)
            .unwrap();
        assert_eq!(
            lending.database().unwrap().available_copy_count(book_id).unwrap(),
            0
        );

        assert!(matches!(
            lending.approve(&admin, RequestKind::Borrow, second.id, None),
            Err(LendingError::BookUnavailable)
        ));
        // The loser stays pending, not rejected.
        let stored = lending
            .database()
            .unwrap()
            .get_borrow_request(second.id)
            .unwrap();
        assert_eq!(stored.status, RequestStatus::Pending);
    }

    #[test]
    fn reject_never_touches_inventory() {
        let lending = service();
        let admin = add_user(&lending, "admin@example.com", Role::Admin);
        let member = add_user(&lending, "member@example.com", Role::User);
        let book_id = add_book(&lending, "হিমু", 3);

        let request = lending.create_borrow_request(&member, book_id).unwrap();
        lending
            .reject(&admin, RequestKind::Borrow, request.id, None)
            .unwrap();

        let (available, notifications) = {
            let db = lending.database().unwrap();
            (
                db.available_copy_count(book_id).unwrap(),
                db.notifications_for_user(member.id).unwrap(),
            )
        };
        assert_eq!(available, 3);
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::BorrowRejected);
    }

    #[test]
    fn borrowing_an_empty_shelf_fails_up_front() {
        let lending = service();
        let member = add_user(&lending, "member@example.com", Role::User);
        let book_id = add_book(&lending, "হিমু", 0);

        assert!(matches!(
            lending.create_borrow_request(&member, book_id),
            Err(LendingError::BookUnavailable)
        ));
    }

    #[test]
    fn duplicate_requests_are_refused() {
        let lending = service();
        let admin = add_user(&lending, "admin@example.com", Role::Admin);
        let member = add_user(&lending, "member@example.com", Role::User);
        let book_id = add_book(&lending, "হিমু", 2);

        let request = lending.create_borrow_request(&member, book_id).unwrap();
        // A second request while the first is pending.
        assert!(matches!(
            lending.create_borrow_request(&member, book_id),
            Err(LendingError::Duplicate(_))
        ));

        // And while the member still holds the copy.
        lending
            .approve(&admin, RequestKind::Borrow, request.id, None)
            .unwrap();
        assert!(matches!(
            lending.create_borrow_request(&member, book_id),
            Err(LendingError::Duplicate(_))
        ));
    }

    #[test]
    fn donation_lifecycle_for_a_new_title() {
        let lending = service();
        let admin = add_user(&lending, "admin@example.com", Role::Admin);
        let member = add_user(&lending, "member@example.com", Role::User);

        let (book, request) = lending
            .create_donation_request(
                &member,
                NewDonation {
                    title: "পাখি ও মানুষ".to_string(),
                    author: "সেলিনা হোসেন".to_string(),
                    description: None,
                    cover_img: None,
                    category: None,
                },
            )
            .unwrap();
        assert_eq!(book.donor_id, Some(member.id));
        assert_eq!(book.category, "সাধারণ");
        assert!(book.isbn.starts_with("DONATED-"));

        // Nothing on the shelf until the admin approves.
        assert_eq!(
            lending.database().unwrap().available_copy_count(book.id).unwrap(),
            0
        );

        lending
            .approve(&admin, RequestKind::Donation, request.id, None)
            .unwrap();

        let (summary, notifications) = {
            let db = lending.database().unwrap();
            (
                db.get_book_summary(book.id).unwrap(),
                db.notifications_for_user(member.id).unwrap(),
            )
        };
        assert_eq!(summary.total_copies, 1);
        assert_eq!(summary.available_copies, 1);
        assert_eq!(notifications[0].kind, NotificationKind::DonationApproved);
    }

    #[test]
    fn donation_without_title_or_author_is_invalid() {
        let lending = service();
        let member = add_user(&lending, "member@example.com", Role::User);

        let blank = NewDonation {
            title: "   ".to_string(),
            author: "কেউ".to_string(),
            description: None,
            cover_img: None,
            category: None,
        };
        assert!(matches!(
            lending.create_donation_request(&member, blank),
            Err(LendingError::Validation(_))
        ));

        let no_author = NewDonation {
            title: "বই".to_string(),
            author: "".to_string(),
            description: None,
            cover_img: None,
            category: None,
        };
        assert!(matches!(
            lending.create_donation_request(&member, no_author),
            Err(LendingError::Validation(_))
        ));
    }

    #[test]
    fn donating_an_existing_title_adds_a_copy_on_approval() {
        let lending = service();
        let admin = add_user(&lending, "admin@example.com", Role::Admin);
        let member = add_user(&lending, "member@example.com", Role::User);
        let book_id = add_book(&lending, "হিমু", 1);

        let request = lending.donate_existing_book(&member, book_id).unwrap();
        lending
            .approve(&admin, RequestKind::Donation, request.id, None)
            .unwrap();

        let summary = lending.database().unwrap().get_book_summary(book_id).unwrap();
        assert_eq!(summary.total_copies, 2);
        assert_eq!(summary.available_copies, 2);
    }

    #[test]
    fn return_is_owner_and_copy_specific() {
        let lending = service();
        let admin = add_user(&lending, "admin@example.com", Role::Admin);
        let alice = add_user(&lending, "alice@example.com", Role::User);
        let bob = add_user(&lending, "bob@example.com", Role::User);
        let book_id = add_book(&lending, "হিমু", 1);

        let request = lending.create_borrow_request(&alice, book_id).unwrap();
        lending
            .approve(&admin, RequestKind::Borrow, request.id, None)
            .unwrap();
        let copy_id = lending
            .database()
            .unwrap()
            .get_borrow_request(request.id)
            .unwrap()
            .copy_id
            .unwrap();

        // Someone else cannot return Alice's loan.
        assert!(matches!(
            lending.return_book(&bob, copy_id),
            Err(LendingError::NotFound)
        ));
        // Nor can Alice return a copy she does not hold.
        assert!(matches!(
            lending.return_book(&alice, copy_id + 100),
            Err(LendingError::NotFound)
        ));

        lending.return_book(&alice, copy_id).unwrap();
        // A second return finds no active loan.
        assert!(matches!(
            lending.return_book(&alice, copy_id),
            Err(LendingError::NotFound)
        ));
    }

    #[test]
    fn pending_queues_are_oldest_first() {
        let lending = service();
        let alice = add_user(&lending, "alice@example.com", Role::User);
        let bob = add_user(&lending, "bob@example.com", Role::User);
        let book_id = add_book(&lending, "হিমু", 2);

        let first = lending.create_borrow_request(&alice, book_id).unwrap();
        let second = lending.create_borrow_request(&bob, book_id).unwrap();

        let queue = lending.pending_borrow_requests().unwrap();
        let ids: Vec<i64> = queue.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }
}
