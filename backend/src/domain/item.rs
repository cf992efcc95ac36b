//! Clothing listings and their moderation/availability lifecycle.
//!
//! An item is created `pending`, moderated to `approved` or `rejected`, and
//! only leaves `approved` for `swapped` or `redeemed` through swap
//! settlement. `is_available` is the flag the swap engine checks; it is
//! cleared exactly once, when the item is settled.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// Minimum listing title length in characters.
pub const TITLE_MIN: usize = 3;
/// Maximum listing title length in characters.
pub const TITLE_MAX: usize = 100;
/// Minimum description length in characters.
pub const DESCRIPTION_MIN: usize = 10;
/// Maximum description length in characters.
pub const DESCRIPTION_MAX: usize = 1000;
/// Lowest points value an item may carry.
pub const POINTS_VALUE_MIN: u32 = 10;
/// Highest points value an item may carry.
pub const POINTS_VALUE_MAX: u32 = 1000;
/// Maximum number of tags per item.
pub const TAGS_MAX: usize = 10;
/// Maximum characters per tag.
pub const TAG_LEN_MAX: usize = 30;
/// Maximum characters for optional free-text attributes.
pub const ATTRIBUTE_LEN_MAX: usize = 60;

/// Validation errors for listing values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    TitleLength { min: usize, max: usize },
    DescriptionLength { min: usize, max: usize },
    PointsValueOutOfRange { min: u32, max: u32 },
    TooManyTags { max: usize },
    InvalidTag { max: usize },
    AttributeTooLong { field: &'static str, max: usize },
    InvalidId,
    UnknownCategory { value: String },
    UnknownGarmentType { value: String },
    UnknownSize { value: String },
    UnknownCondition { value: String },
    UnknownStatus { value: String },
}

impl fmt::Display for ItemValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TitleLength { min, max } => {
                write!(f, "title must be between {min} and {max} characters")
            }
            Self::DescriptionLength { min, max } => {
                write!(f, "description must be between {min} and {max} characters")
            }
            Self::PointsValueOutOfRange { min, max } => {
                write!(f, "points value must be between {min} and {max}")
            }
            Self::TooManyTags { max } => write!(f, "at most {max} tags are allowed"),
            Self::InvalidTag { max } => {
                write!(f, "tags must be non-empty and at most {max} characters")
            }
            Self::AttributeTooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
            Self::InvalidId => write!(f, "item id must be a valid UUID"),
            Self::UnknownCategory { value } => write!(f, "unknown category: {value}"),
            Self::UnknownGarmentType { value } => write!(f, "unknown type: {value}"),
            Self::UnknownSize { value } => write!(f, "unknown size: {value}"),
            Self::UnknownCondition { value } => write!(f, "unknown condition: {value}"),
            Self::UnknownStatus { value } => write!(f, "unknown item status: {value}"),
        }
    }
}

impl std::error::Error for ItemValidationError {}

/// Stable item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Parse an identifier from its string form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, ItemValidationError> {
        Uuid::parse_str(id.as_ref())
            .map(Self)
            .map_err(|_| ItemValidationError::InvalidId)
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Generates a closed string enum with `as_str`, `Display`, `FromStr` and
/// an `ALL` listing.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $error:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Stable storage and wire representation.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ItemValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ItemValidationError::$error {
                        value: other.to_owned(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// Garment category.
    Category, UnknownCategory {
        Tops => "tops",
        Bottoms => "bottoms",
        Dresses => "dresses",
        Outerwear => "outerwear",
        Shoes => "shoes",
        Accessories => "accessories",
        Other => "other",
    }
}

string_enum! {
    /// Garment style, exposed on the wire as `type`.
    GarmentType, UnknownGarmentType {
        Casual => "casual",
        Formal => "formal",
        Sportswear => "sportswear",
        Vintage => "vintage",
        Designer => "designer",
        Other => "other",
    }
}

string_enum! {
    /// Labelled garment size.
    Size, UnknownSize {
        Xs => "XS",
        S => "S",
        M => "M",
        L => "L",
        Xl => "XL",
        Xxl => "XXL",
        OneSize => "One Size",
        Other => "Other",
    }
}

string_enum! {
    /// Wear condition declared by the owner.
    Condition, UnknownCondition {
        New => "new",
        LikeNew => "like-new",
        Good => "good",
        Fair => "fair",
        Poor => "poor",
    }
}

string_enum! {
    /// Moderation and settlement status.
    ItemStatus, UnknownStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Available => "available",
        Swapped => "swapped",
        Redeemed => "redeemed",
    }
}

impl ItemStatus {
    /// Whether the item has left the catalogue through settlement.
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Swapped | Self::Redeemed)
    }
}

fn bounded_text(
    value: &str,
    min: usize,
    max: usize,
    error: ItemValidationError,
) -> Result<String, ItemValidationError> {
    let trimmed = value.trim();
    let length = trimmed.chars().count();
    if length < min || length > max {
        return Err(error);
    }
    Ok(trimmed.to_owned())
}

/// Listing title (3..=100 characters once trimmed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTitle(String);

impl ItemTitle {
    /// Validate a title.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ItemValidationError> {
        bounded_text(
            value.as_ref(),
            TITLE_MIN,
            TITLE_MAX,
            ItemValidationError::TitleLength {
                min: TITLE_MIN,
                max: TITLE_MAX,
            },
        )
        .map(Self)
    }
}

impl AsRef<str> for ItemTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Listing description (10..=1000 characters once trimmed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDescription(String);

impl ItemDescription {
    /// Validate a description.
    pub fn new(value: impl AsRef<str>) -> Result<Self, ItemValidationError> {
        bounded_text(
            value.as_ref(),
            DESCRIPTION_MIN,
            DESCRIPTION_MAX,
            ItemValidationError::DescriptionLength {
                min: DESCRIPTION_MIN,
                max: DESCRIPTION_MAX,
            },
        )
        .map(Self)
    }
}

impl AsRef<str> for ItemDescription {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Points price of an item.
///
/// # Examples
/// ```
/// use rewear_backend::domain::PointsValue;
///
/// assert!(PointsValue::new(150).is_ok());
/// assert!(PointsValue::new(5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PointsValue(u32);

impl PointsValue {
    /// Validate a points value against the allowed range.
    pub fn new(value: u32) -> Result<Self, ItemValidationError> {
        if (POINTS_VALUE_MIN..=POINTS_VALUE_MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ItemValidationError::PointsValueOutOfRange {
                min: POINTS_VALUE_MIN,
                max: POINTS_VALUE_MAX,
            })
        }
    }

    /// Raw points amount.
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Normalised tag list: trimmed, lowercased and de-duplicated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tags(Vec<String>);

impl Tags {
    /// Validate and normalise tags.
    pub fn new<I, S>(values: I) -> Result<Self, ItemValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags: Vec<String> = Vec::new();
        for value in values {
            let tag = value.as_ref().trim().to_lowercase();
            if tag.is_empty() || tag.chars().count() > TAG_LEN_MAX {
                return Err(ItemValidationError::InvalidTag { max: TAG_LEN_MAX });
            }
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        if tags.len() > TAGS_MAX {
            return Err(ItemValidationError::TooManyTags { max: TAGS_MAX });
        }
        Ok(Self(tags))
    }

    /// Tags as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Optional descriptive attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemAttributes {
    pub brand: Option<String>,
    pub colour: Option<String>,
    pub material: Option<String>,
    pub location: Option<String>,
}

fn optional_attribute(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<String>, ItemValidationError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > ATTRIBUTE_LEN_MAX {
        return Err(ItemValidationError::AttributeTooLong {
            field,
            max: ATTRIBUTE_LEN_MAX,
        });
    }
    Ok(Some(trimmed.to_owned()))
}

impl ItemAttributes {
    /// Validate attributes, dropping blank values.
    pub fn new(
        brand: Option<String>,
        colour: Option<String>,
        material: Option<String>,
        location: Option<String>,
    ) -> Result<Self, ItemValidationError> {
        Ok(Self {
            brand: optional_attribute(brand, "brand")?,
            colour: optional_attribute(colour, "colour")?,
            material: optional_attribute(material, "material")?,
            location: optional_attribute(location, "location")?,
        })
    }
}

/// Validated owner-editable listing content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub title: ItemTitle,
    pub description: ItemDescription,
    pub category: Category,
    pub garment_type: GarmentType,
    pub size: Size,
    pub condition: Condition,
    pub points_value: PointsValue,
    pub tags: Tags,
    pub attributes: ItemAttributes,
}

/// Stored listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub owner_id: UserId,
    pub title: ItemTitle,
    pub description: ItemDescription,
    pub category: Category,
    pub garment_type: GarmentType,
    pub size: Size,
    pub condition: Condition,
    pub points_value: PointsValue,
    pub tags: Tags,
    pub attributes: ItemAttributes,
    pub status: ItemStatus,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Create a new pending, available listing owned by `owner_id`.
    pub fn list(owner_id: UserId, draft: ItemDraft, now: DateTime<Utc>) -> Self {
        let ItemDraft {
            title,
            description,
            category,
            garment_type,
            size,
            condition,
            points_value,
            tags,
            attributes,
        } = draft;
        Self {
            id: ItemId::random(),
            owner_id,
            title,
            description,
            category,
            garment_type,
            size,
            condition,
            points_value,
            tags,
            attributes,
            status: ItemStatus::Pending,
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the owner-editable content, leaving status and ownership intact.
    pub fn revise(&mut self, draft: ItemDraft, now: DateTime<Utc>) {
        self.title = draft.title;
        self.description = draft.description;
        self.category = draft.category;
        self.garment_type = draft.garment_type;
        self.size = draft.size;
        self.condition = draft.condition;
        self.points_value = draft.points_value;
        self.tags = draft.tags;
        self.attributes = draft.attributes;
        self.updated_at = now;
    }

    /// Whether `user_id` owns this listing.
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.owner_id == user_id
    }

    /// Whether the item shows up in the public catalogue.
    pub fn is_listed(&self) -> bool {
        self.status == ItemStatus::Approved && self.is_available
    }

    /// Case-insensitive match of `term` against title and description, or an
    /// exact match against a tag.
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.as_ref().to_lowercase().contains(&needle)
            || self.description.as_ref().to_lowercase().contains(&needle)
            || self.tags.as_slice().iter().any(|tag| tag == &needle)
    }
}

/// Listing paired with its owner for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDetails {
    pub item: Item,
    pub owner: super::UserSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample_draft() -> ItemDraft {
        ItemDraft {
            title: ItemTitle::new("Denim jacket").expect("valid title"),
            description: ItemDescription::new("Classic blue denim, barely worn.")
                .expect("valid description"),
            category: Category::Outerwear,
            garment_type: GarmentType::Casual,
            size: Size::M,
            condition: Condition::LikeNew,
            points_value: PointsValue::new(120).expect("valid points"),
            tags: Tags::new(["Denim", "blue"]).expect("valid tags"),
            attributes: ItemAttributes::default(),
        }
    }

    #[rstest]
    #[case("ab", false)]
    #[case("abc", true)]
    #[case("   padded title   ", true)]
    fn title_length_is_enforced(#[case] raw: &str, #[case] ok: bool) {
        assert_eq!(ItemTitle::new(raw).is_ok(), ok);
    }

    #[rstest]
    #[case(9, false)]
    #[case(10, true)]
    #[case(1000, true)]
    #[case(1001, false)]
    fn points_value_bounds(#[case] raw: u32, #[case] ok: bool) {
        assert_eq!(PointsValue::new(raw).is_ok(), ok);
    }

    #[rstest]
    fn tags_are_normalised_and_deduplicated() {
        let tags = Tags::new([" Summer ", "summer", "Linen"]).expect("valid tags");
        assert_eq!(tags.as_slice(), ["summer", "linen"]);
    }

    #[rstest]
    fn blank_tags_are_rejected() {
        assert_eq!(
            Tags::new(["ok", "  "]),
            Err(ItemValidationError::InvalidTag { max: TAG_LEN_MAX })
        );
    }

    #[rstest]
    fn enums_parse_wire_values() {
        assert_eq!("like-new".parse::<Condition>(), Ok(Condition::LikeNew));
        assert_eq!("One Size".parse::<Size>(), Ok(Size::OneSize));
        assert_eq!("redeemed".parse::<ItemStatus>(), Ok(ItemStatus::Redeemed));
        assert!("hats".parse::<Category>().is_err());
        for garment in GarmentType::ALL {
            assert_eq!(garment.as_str().parse::<GarmentType>(), Ok(*garment));
        }
    }

    #[rstest]
    fn new_listings_are_pending_and_available() {
        let owner = UserId::random();
        let item = Item::list(owner, sample_draft(), Utc::now());
        assert_eq!(item.status, ItemStatus::Pending);
        assert!(item.is_available);
        assert!(item.is_owned_by(&owner));
        assert!(!item.is_listed());
    }

    #[rstest]
    #[case("denim", true)]
    #[case("BARELY", true)]
    #[case("blue", true)]
    #[case("jackets", false)]
    #[case("silk", false)]
    fn search_matches_text_and_exact_tags(#[case] term: &str, #[case] expected: bool) {
        let item = Item::list(UserId::random(), sample_draft(), Utc::now());
        assert_eq!(item.matches_search(term), expected);
    }
}
