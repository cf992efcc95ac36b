//! Test utilities for the backend crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled for tests or with the
//! `test-support` feature.

pub mod clock {
    //! Deterministic clocks for services that take `Arc<dyn Clock>`.

    use std::sync::Mutex;

    use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
    use mockable::Clock;

    /// Timestamp used by fixtures unless a test needs something else.
    pub fn fixture_timestamp() -> DateTime<Utc> {
        match Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).single() {
            Some(timestamp) => timestamp,
            None => panic!("fixture timestamp is unambiguous"),
        }
    }

    /// Clock that advances one second on every read, so records created in
    /// sequence get strictly increasing timestamps.
    pub struct MutableClock(Mutex<DateTime<Utc>>);

    impl MutableClock {
        pub fn new(now: DateTime<Utc>) -> Self {
            Self(Mutex::new(now))
        }

        pub fn advance_seconds(&self, seconds: i64) {
            *self.lock_clock() += TimeDelta::seconds(seconds);
        }

        fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
            match self.0.lock() {
                Ok(guard) => guard,
                Err(_) => panic!("clock mutex"),
            }
        }
    }

    impl Default for MutableClock {
        fn default() -> Self {
            Self::new(fixture_timestamp())
        }
    }

    impl Clock for MutableClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            let mut now = self.lock_clock();
            *now += TimeDelta::seconds(1);
            *now
        }
    }
}

pub mod fixtures {
    //! Builders for accounts and listings used across test suites.

    use chrono::{DateTime, Utc};

    use crate::domain::{
        Category, Condition, DisplayName, GarmentType, Item, ItemAttributes, ItemDescription,
        ItemDraft, ItemStatus, ItemTitle, PointsValue, Role, Size, Tags, UserAccount, UserId,
        Username,
    };

    use super::clock::fixture_timestamp;

    /// Account with the given username, role and balance.
    pub fn account(username: &str, role: Role, points: u32) -> UserAccount {
        let display = format!("{username} display");
        UserAccount {
            id: UserId::random(),
            username: Username::new(username).expect("fixture username"),
            display_name: DisplayName::new(display).expect("fixture display name"),
            role,
            points,
            created_at: fixture_timestamp(),
        }
    }

    /// Valid listing content with the given title and points value.
    pub fn draft(title: &str, points_value: u32) -> ItemDraft {
        ItemDraft {
            title: ItemTitle::new(title).expect("fixture title"),
            description: ItemDescription::new(format!("{title} in good shape, barely worn"))
                .expect("fixture description"),
            category: Category::Tops,
            garment_type: GarmentType::Casual,
            size: Size::M,
            condition: Condition::Good,
            points_value: PointsValue::new(points_value).expect("fixture points value"),
            tags: Tags::new(["cotton"]).expect("fixture tags"),
            attributes: ItemAttributes::default(),
        }
    }

    /// Approved, available listing owned by `owner`.
    pub fn approved_item(owner: UserId, title: &str, points_value: u32) -> Item {
        approved_item_at(owner, title, points_value, fixture_timestamp())
    }

    /// Approved, available listing created at `created_at`.
    pub fn approved_item_at(
        owner: UserId,
        title: &str,
        points_value: u32,
        created_at: DateTime<Utc>,
    ) -> Item {
        let mut item = Item::list(owner, draft(title, points_value), created_at);
        item.status = ItemStatus::Approved;
        item
    }
}

pub mod openapi {
    //! OpenAPI schema traversal helpers.
    //!
    //! Resolves `RefOr<Schema>` wrappers to concrete `Object` schemas with
    //! diagnostic messages on type mismatches.

    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::{Object, Schema};

    /// Extract an `Object` schema, panicking with a diagnostic if not an Object.
    pub fn unwrap_object_schema<'a>(schema: &'a RefOr<Schema>, name: &str) -> &'a Object {
        match schema {
            RefOr::T(Schema::Object(obj)) => obj,
            RefOr::Ref(reference) => {
                panic!(
                    "schema '{name}' is a $ref to '{}'; resolve the reference first",
                    reference.ref_location
                );
            }
            RefOr::T(Schema::AllOf(_)) => {
                panic!("schema '{name}' is an AllOf combinator; inspect composed schemas");
            }
            RefOr::T(Schema::OneOf(_)) => {
                panic!("schema '{name}' is a OneOf combinator; inspect variant schemas");
            }
            RefOr::T(Schema::Array(_)) => {
                panic!("schema '{name}' is an Array, not an Object");
            }
            _ => panic!("schema '{name}' has unexpected type"),
        }
    }
}
