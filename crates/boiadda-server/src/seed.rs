//! Demo data for local development.
//!
//! Mirrors the community's original sample library: a handful of Bengali
//! members and titles, with a few copies already out on loan so the admin
//! dashboard has something to show.

use chrono::{Duration, Utc};
use tracing::info;

use boiadda_store::{CopyStatus, Database, NewBook, NewUser, Role, StoreError};

use crate::auth::hash_password;

/// Populate an empty database with demo users, books, and copies.
///
/// Callers are expected to check that the database is empty first; seeding is
/// additive and does not deduplicate.
pub fn seed_demo_data(db: &Database) -> Result<(), StoreError> {
    let users = [
        ("আদিয়াত হোসেন (অ্যাডমিন)", "adiyat_admin@example.com", "01711110001", "adminpass1", Role::Admin),
        ("সাবিনা ইয়াসমিন (মডারেটর)", "sabina_mod@example.com", "01733330003", "modpass1", Role::User),
        ("রহিম উদ্দিন", "rahim@example.com", "01722220002", "userpass1", Role::User),
        ("তানভীর আহমেদ", "tanvir@example.com", "01744440004", "userpass2", Role::User),
        ("মাহিরা ইসলাম", "mahera@example.com", "01755550005", "userpass3", Role::User),
        ("রুশদী হাসান", "rushdi@example.com", "01766660006", "userpass4", Role::User),
        ("লতিফা নাসরিন", "latifa@example.com", "01777770007", "userpass5", Role::User),
        ("Demo User", "demo@boiadda.com", "01700000000", "Demo123456", Role::User),
    ];

    let mut user_ids = Vec::with_capacity(users.len());
    for (name, email, phone, password, role) in users {
        let user = db.create_user(&NewUser {
            name: name.to_string(),
            email: email.to_string(),
            phone: Some(phone.to_string()),
            password_hash: hash_password(password),
            role,
        })?;
        user_ids.push(user.id);
    }
    let admin_id = user_ids[0];

    let books = [
        ("আজব দুনিয়া", "মুহম্মদ জাফর ইকবাল", "9789848000001", "book1.png", "বিজ্ঞান ও কল্পনার এক অসাধারণ মিশেল।", "বিজ্ঞান কল্পকাহিনি", user_ids[0]),
        ("হিমু", "হুমায়ূন আহমেদ", "9789848000002", "book2.png", "হিমু চরিত্রের কল্পনাজাত মজার কাহিনী।", "উপন্যাস", user_ids[2]),
        ("পাখি ও মানুষ", "সেলিনা হোসেন", "9789848000003", "book3.png", "পাখি আর মানুষের সম্পর্ক নিয়ে সাহিত্য।", "সাহিত্য", user_ids[2]),
        ("চাঁদের আলো", "আনিসুজ্জামান", "9789848000004", "book4.png", "রোমান্টিক ও রহস্যময় এক উপন্যাস।", "উপন্যাস", user_ids[2]),
        ("বাংলার ইতিহাস", "ইমদাদুল হক মিলন", "9789848000005", "book5.png", "বাংলাদেশের ঐতিহাসিক তথ্যাবলী।", "ইতিহাস", user_ids[2]),
        ("কবিতা সংগ্রহ", "জাহিদা হোসেন", "9789848000006", "book6.png", "নান্দনিক কাব্য রচনা।", "কাব্য", user_ids[6]),
    ];

    let mut book_ids = Vec::with_capacity(books.len());
    for (title, author, isbn, cover, description, category, donor_id) in books {
        let book = db.create_book(&NewBook {
            title: title.to_string(),
            author: author.to_string(),
            isbn: isbn.to_string(),
            description: Some(description.to_string()),
            category: category.to_string(),
            cover_img: Some(cover.to_string()),
            donor_id: Some(donor_id),
        })?;
        book_ids.push(book.id);
    }

    // (book index, status, holder index) -- a snapshot of a working library.
    let copies = [
        (0, CopyStatus::Available, None),
        (0, CopyStatus::Available, None),
        (0, CopyStatus::Borrowed, Some(2)),
        (1, CopyStatus::Available, None),
        (1, CopyStatus::Borrowed, Some(3)),
        (1, CopyStatus::Lost, None),
        (2, CopyStatus::Available, None),
        (3, CopyStatus::Available, None),
        (3, CopyStatus::Available, None),
        (4, CopyStatus::Borrowed, Some(4)),
        (4, CopyStatus::Available, None),
        (4, CopyStatus::Lost, None),
        (5, CopyStatus::Available, None),
    ];

    for (book_idx, status, holder_idx) in copies {
        let holder_id = holder_idx.map(|i: usize| user_ids[i]);
        let copy = db.add_copy_with_status(book_ids[book_idx], status, holder_id)?;

        // Give each loaned copy a matching approved borrow request so the
        // holder can actually return it.
        if let Some(holder_id) = holder_id {
            let request = db.insert_borrow_request(holder_id, book_ids[book_idx])?;
            let now = Utc::now();
            db.approve_borrow_request(
                request.id,
                copy.id,
                admin_id,
                None,
                now + Duration::days(14),
                now,
            )?;
        }
    }

    info!(
        users = user_ids.len(),
        books = book_ids.len(),
        copies = copies.len(),
        "demo data seeded"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_a_consistent_library() {
        let db = Database::open_in_memory().unwrap();
        seed_demo_data(&db).unwrap();

        assert_eq!(db.count_users().unwrap(), 8);
        assert_eq!(db.list_book_summaries().unwrap().len(), 6);

        // The admin account exists and can log in.
        let admin = db
            .get_user_by_email("adiyat_admin@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(crate::auth::verify_password("adminpass1", &admin.password_hash));

        // Every borrowed copy has a matching active loan.
        let rahim = db.get_user_by_email("rahim@example.com").unwrap().unwrap();
        let loans = db.active_borrows_for_user(rahim.id).unwrap();
        assert_eq!(loans.len(), 1);
        let copy = db.get_copy(loans[0].copy_id.unwrap()).unwrap();
        assert_eq!(copy.status, CopyStatus::Borrowed);
        assert_eq!(copy.holder_id, Some(rahim.id));

        // Lost copies count toward neither shelf nor total.
        let himu = &db.list_book_summaries().unwrap()[1];
        assert_eq!(himu.total_copies, 2);
        assert_eq!(himu.available_copies, 1);
    }
}
