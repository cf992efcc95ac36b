//! Internal Diesel row structs and their conversions.
//!
//! These types are implementation details of the persistence layer and never
//! leave it. Reading a row back re-validates every value object so a corrupt
//! row surfaces as a query error instead of an invalid aggregate.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    DisplayName, Item, ItemAttributes, ItemDescription, ItemId, ItemTitle, PointsValue, Role,
    SwapId, SwapMessage, SwapOffer, SwapRequest, SwapType, Tags, UserAccount, UserId, Username,
};

use super::schema::{items, swap_requests, users};

fn invalid(column: &str, error: impl Display) -> String {
    format!("invalid {column} column: {error}")
}

fn parse_column<T>(column: &str, raw: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse().map_err(|error| invalid(column, error))
}

fn unsigned(column: &str, value: i32) -> Result<u32, String> {
    u32::try_from(value).map_err(|error| invalid(column, error))
}

/// Convert a domain count into the signed column type.
pub(crate) fn signed(column: &str, value: u32) -> Result<i32, String> {
    i32::try_from(value).map_err(|error| invalid(column, error))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub points: i32,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub(crate) fn into_domain(self) -> Result<UserAccount, String> {
        Ok(UserAccount {
            id: UserId::from_uuid(self.id),
            username: Username::new(&self.username).map_err(|e| invalid("username", e))?,
            display_name: DisplayName::new(&self.display_name)
                .map_err(|e| invalid("display_name", e))?,
            role: parse_column::<Role>("role", &self.role)?,
            points: unsigned("points", self.points)?,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub display_name: &'a str,
    pub role: &'a str,
    pub points: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> NewUserRow<'a> {
    pub(crate) fn from_domain(account: &'a UserAccount) -> Result<Self, String> {
        Ok(Self {
            id: *account.id.as_uuid(),
            username: account.username.as_ref(),
            display_name: account.display_name.as_ref(),
            role: account.role.as_str(),
            points: signed("points", account.points)?,
            created_at: account.created_at,
            updated_at: account.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ItemRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub garment_type: String,
    pub size: String,
    pub condition: String,
    pub points_value: i32,
    pub status: String,
    pub is_available: bool,
    pub brand: Option<String>,
    pub colour: Option<String>,
    pub material: Option<String>,
    pub location: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemRow {
    pub(crate) fn into_domain(self) -> Result<Item, String> {
        let points = unsigned("points_value", self.points_value)?;
        Ok(Item {
            id: ItemId::from_uuid(self.id),
            owner_id: UserId::from_uuid(self.owner_id),
            title: ItemTitle::new(&self.title).map_err(|e| invalid("title", e))?,
            description: ItemDescription::new(&self.description)
                .map_err(|e| invalid("description", e))?,
            category: parse_column("category", &self.category)?,
            garment_type: parse_column("garment_type", &self.garment_type)?,
            size: parse_column("size", &self.size)?,
            condition: parse_column("condition", &self.condition)?,
            points_value: PointsValue::new(points).map_err(|e| invalid("points_value", e))?,
            tags: Tags::new(&self.tags).map_err(|e| invalid("tags", e))?,
            attributes: ItemAttributes::new(self.brand, self.colour, self.material, self.location)
                .map_err(|e| invalid("attributes", e))?,
            status: parse_column("status", &self.status)?,
            is_available: self.is_available,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = items)]
pub(crate) struct NewItemRow<'a> {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub garment_type: &'a str,
    pub size: &'a str,
    pub condition: &'a str,
    pub points_value: i32,
    pub status: &'a str,
    pub is_available: bool,
    pub brand: Option<&'a str>,
    pub colour: Option<&'a str>,
    pub material: Option<&'a str>,
    pub location: Option<&'a str>,
    pub tags: &'a [String],
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> NewItemRow<'a> {
    pub(crate) fn from_domain(item: &'a Item) -> Result<Self, String> {
        let content = ItemContentUpdate::from_domain(item)?;
        Ok(Self {
            id: *item.id.as_uuid(),
            owner_id: *item.owner_id.as_uuid(),
            title: content.title,
            description: content.description,
            category: content.category,
            garment_type: content.garment_type,
            size: content.size,
            condition: content.condition,
            points_value: content.points_value,
            status: item.status.as_str(),
            is_available: item.is_available,
            brand: content.brand,
            colour: content.colour,
            material: content.material,
            location: content.location,
            tags: content.tags,
            created_at: item.created_at,
            updated_at: content.updated_at,
        })
    }
}

/// Owner-editable columns. Status and availability belong to moderation and
/// settlement.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = items)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ItemContentUpdate<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub garment_type: &'a str,
    pub size: &'a str,
    pub condition: &'a str,
    pub points_value: i32,
    pub brand: Option<&'a str>,
    pub colour: Option<&'a str>,
    pub material: Option<&'a str>,
    pub location: Option<&'a str>,
    pub tags: &'a [String],
    pub updated_at: DateTime<Utc>,
}

impl<'a> ItemContentUpdate<'a> {
    pub(crate) fn from_domain(item: &'a Item) -> Result<Self, String> {
        let attributes = &item.attributes;
        Ok(Self {
            title: item.title.as_ref(),
            description: item.description.as_ref(),
            category: item.category.as_str(),
            garment_type: item.garment_type.as_str(),
            size: item.size.as_str(),
            condition: item.condition.as_str(),
            points_value: signed("points_value", item.points_value.get())?,
            brand: attributes.brand.as_deref(),
            colour: attributes.colour.as_deref(),
            material: attributes.material.as_deref(),
            location: attributes.location.as_deref(),
            tags: item.tags.as_slice(),
            updated_at: item.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Swap requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = swap_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SwapRow {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub item_requested_id: Uuid,
    pub item_offered_id: Option<Uuid>,
    pub points_offered: Option<i32>,
    pub swap_type: String,
    pub status: String,
    pub message: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SwapRow {
    pub(crate) fn into_domain(self) -> Result<SwapRequest, String> {
        let swap_type = parse_column::<SwapType>("swap_type", &self.swap_type)?;
        let points = self
            .points_offered
            .map(|points| unsigned("points_offered", points))
            .transpose()?;
        let item_offered = self.item_offered_id.map(ItemId::from_uuid);
        let offer = SwapOffer::from_parts(swap_type, item_offered, points)
            .map_err(|e| invalid("offer", e))?;
        Ok(SwapRequest {
            id: SwapId::from_uuid(self.id),
            requester_id: UserId::from_uuid(self.requester_id),
            item_requested_id: ItemId::from_uuid(self.item_requested_id),
            offer,
            status: parse_column("status", &self.status)?,
            message: SwapMessage::parse(self.message).map_err(|e| invalid("message", e))?,
            completed_at: self.completed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = swap_requests)]
pub(crate) struct NewSwapRow<'a> {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub item_requested_id: Uuid,
    pub item_offered_id: Option<Uuid>,
    pub points_offered: Option<i32>,
    pub swap_type: &'a str,
    pub status: &'a str,
    pub message: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> NewSwapRow<'a> {
    pub(crate) fn from_domain(swap: &'a SwapRequest) -> Result<Self, String> {
        Ok(Self {
            id: *swap.id.as_uuid(),
            requester_id: *swap.requester_id.as_uuid(),
            item_requested_id: *swap.item_requested_id.as_uuid(),
            item_offered_id: swap.offer.item_offered().map(|id| *id.as_uuid()),
            points_offered: swap
                .offer
                .points_offered()
                .map(|points| signed("points_offered", points))
                .transpose()?,
            swap_type: swap.offer.swap_type().as_str(),
            status: swap.status.as_str(),
            message: swap.message.as_ref().map(AsRef::as_ref),
            created_at: swap.created_at,
            updated_at: swap.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SwapStatus;
    use crate::test_support::clock::fixture_timestamp;
    use crate::test_support::fixtures::{account, approved_item};
    use rstest::rstest;

    fn item_row(item: &Item) -> ItemRow {
        let new = NewItemRow::from_domain(item).expect("row");
        ItemRow {
            id: new.id,
            owner_id: new.owner_id,
            title: new.title.to_owned(),
            description: new.description.to_owned(),
            category: new.category.to_owned(),
            garment_type: new.garment_type.to_owned(),
            size: new.size.to_owned(),
            condition: new.condition.to_owned(),
            points_value: new.points_value,
            status: new.status.to_owned(),
            is_available: new.is_available,
            brand: new.brand.map(str::to_owned),
            colour: new.colour.map(str::to_owned),
            material: new.material.map(str::to_owned),
            location: new.location.map(str::to_owned),
            tags: new.tags.to_vec(),
            created_at: new.created_at,
            updated_at: new.updated_at,
        }
    }

    #[rstest]
    fn stored_item_reads_back_unchanged() {
        let owner = account("owner", Role::User, 100);
        let item = approved_item(owner.id, "Wool coat", 150);
        let restored = item_row(&item).into_domain().expect("valid row");
        assert_eq!(restored, item);
    }

    #[rstest]
    #[case("status", "lost")]
    #[case("category", "hats")]
    #[case("size", "xs")]
    fn unknown_enum_values_are_rejected(#[case] column: &str, #[case] value: &str) {
        let owner = account("owner", Role::User, 100);
        let mut row = item_row(&approved_item(owner.id, "Wool coat", 150));
        match column {
            "status" => row.status = value.to_owned(),
            "category" => row.category = value.to_owned(),
            _ => row.size = value.to_owned(),
        }
        let err = row.into_domain().expect_err("invalid row");
        assert!(err.contains(column), "{err}");
    }

    #[rstest]
    fn negative_balance_is_rejected() {
        let row = UserRow {
            id: Uuid::nil(),
            username: "alice".to_owned(),
            display_name: "Alice".to_owned(),
            role: "user".to_owned(),
            points: -1,
            created_at: fixture_timestamp(),
        };
        let err = row.into_domain().expect_err("negative points");
        assert!(err.contains("points"), "{err}");
    }

    #[rstest]
    fn swap_row_with_both_offers_is_rejected() {
        let row = SwapRow {
            id: Uuid::nil(),
            requester_id: Uuid::nil(),
            item_requested_id: Uuid::nil(),
            item_offered_id: Some(Uuid::nil()),
            points_offered: Some(10),
            swap_type: "direct".to_owned(),
            status: SwapStatus::Pending.as_str().to_owned(),
            message: None,
            completed_at: None,
            created_at: fixture_timestamp(),
            updated_at: fixture_timestamp(),
        };
        assert!(row.into_domain().is_err());
    }
}
