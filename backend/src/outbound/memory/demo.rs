//! Demo accounts and listings for local development.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;

use crate::domain::{
    Category, Condition, DisplayName, GarmentType, Item, ItemAttributes, ItemDescription,
    ItemDraft, ItemStatus, ItemTitle, ItemValidationError, PointsValue, Role, Size, Tags,
    UserAccount, UserValidationError, Username,
};

use super::InMemoryStore;

/// Errors raised while seeding demo data.
#[derive(Debug, thiserror::Error)]
pub enum DemoDataError {
    /// A demo account failed validation.
    #[error("invalid demo account: {0}")]
    Account(#[from] UserValidationError),
    /// A demo listing failed validation.
    #[error("invalid demo listing: {0}")]
    Item(#[from] ItemValidationError),
    /// The store lock was poisoned.
    #[error("{0}")]
    Store(&'static str),
}

struct DemoListing {
    title: &'static str,
    description: &'static str,
    category: Category,
    garment_type: GarmentType,
    size: Size,
    condition: Condition,
    points: u32,
    tags: &'static [&'static str],
    brand: Option<&'static str>,
}

const LISTINGS: &[DemoListing] = &[
    DemoListing {
        title: "Vintage denim jacket",
        description: "Classic blue denim jacket with brass buttons, softly faded.",
        category: Category::Outerwear,
        garment_type: GarmentType::Vintage,
        size: Size::M,
        condition: Condition::Good,
        points: 120,
        tags: &["denim", "vintage"],
        brand: Some("Levi's"),
    },
    DemoListing {
        title: "Linen summer dress",
        description: "Lightweight linen midi dress, ideal for warm afternoons.",
        category: Category::Dresses,
        garment_type: GarmentType::Casual,
        size: Size::S,
        condition: Condition::LikeNew,
        points: 90,
        tags: &["linen", "summer"],
        brand: None,
    },
    DemoListing {
        title: "Trail running shoes",
        description: "Grippy trail shoes worn for one season, plenty of tread left.",
        category: Category::Shoes,
        garment_type: GarmentType::Sportswear,
        size: Size::Other,
        condition: Condition::Fair,
        points: 60,
        tags: &["running", "outdoor"],
        brand: Some("Salomon"),
    },
];

fn account(
    username: &str,
    display_name: &str,
    role: Role,
    created_at: DateTime<Utc>,
) -> Result<UserAccount, DemoDataError> {
    let mut account = UserAccount::register(
        Username::new(username)?,
        DisplayName::new(display_name)?,
        created_at,
    );
    account.role = role;
    Ok(account)
}

fn listing(
    owner: &UserAccount,
    entry: &DemoListing,
    created_at: DateTime<Utc>,
) -> Result<Item, DemoDataError> {
    let draft = ItemDraft {
        title: ItemTitle::new(entry.title)?,
        description: ItemDescription::new(entry.description)?,
        category: entry.category,
        garment_type: entry.garment_type,
        size: entry.size,
        condition: entry.condition,
        points_value: PointsValue::new(entry.points)?,
        tags: Tags::new(entry.tags.iter().copied())?,
        attributes: ItemAttributes::new(entry.brand.map(str::to_owned), None, None, None)?,
    };
    let mut item = Item::list(owner.id, draft, created_at);
    item.status = ItemStatus::Approved;
    Ok(item)
}

impl InMemoryStore {
    /// Populate the store with an admin, two members and approved listings.
    ///
    /// Every demo account logs in with the configured shared password.
    pub fn seed_demo_data(&self, now: DateTime<Utc>) -> Result<(), DemoDataError> {
        let admin = account("admin", "ReWear Admin", Role::Admin, now)?;
        let alice = account("alice", "Alice", Role::User, now)?;
        let bob = account("bob", "Bob", Role::User, now)?;
        let owners = [&alice, &bob, &alice];

        let mut items = Vec::with_capacity(LISTINGS.len());
        let mut created_at = now;
        for (entry, owner) in LISTINGS.iter().zip(owners) {
            created_at += TimeDelta::seconds(1);
            items.push(listing(owner, entry, created_at)?);
        }

        let mut state = self.lock().map_err(DemoDataError::Store)?;
        for user in [admin, alice, bob] {
            state.users.insert(user.id, user);
        }
        for item in items {
            state.items.insert(item.id, item);
        }
        info!(
            users = state.users.len(),
            items = state.items.len(),
            "seeded in-memory demo data"
        );
        Ok(())
    }
}
