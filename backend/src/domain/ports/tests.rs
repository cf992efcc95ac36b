use super::*;
use crate::domain::ItemId;
use rstest::rstest;

#[rstest]
fn port_error_constructors_format_messages() {
    assert_eq!(
        ItemRepositoryError::connection("refused").to_string(),
        "item repository connection failed: refused"
    );
    assert_eq!(
        UserAccountRepositoryError::duplicate_username("alice").to_string(),
        "username alice is already taken"
    );
    assert_eq!(
        SwapRepositoryError::duplicate_pending().to_string(),
        "a pending swap for this item already exists"
    );
    assert_eq!(
        SwapRepositoryError::insufficient_balance(5_u32).to_string(),
        "balance 5 does not cover the transfer"
    );
}

#[rstest]
fn item_unavailable_names_the_item() {
    let item_id = ItemId::random();
    let err = SwapRepositoryError::item_unavailable(item_id);
    assert_eq!(err, SwapRepositoryError::ItemUnavailable { item_id });
    assert!(err.to_string().contains(&item_id.to_string()));
}

#[rstest]
fn browse_query_defaults_to_empty_filters() {
    let query = ItemBrowseQuery::default();
    assert!(query.category.is_none());
    assert!(query.search.is_none());
    assert_eq!(query.offset, 0);
}
