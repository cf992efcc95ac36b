//! Unit coverage for catalogue paging and owner rules.

use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::ports::{ItemPage, MockItemRepository, MockUserAccountRepository};
use crate::domain::{ErrorCode, ItemStatus, Role};
use crate::test_support::clock::MutableClock;
use crate::test_support::fixtures::{account, approved_item, draft};

fn users_returning(accounts: Vec<UserAccount>) -> MockUserAccountRepository {
    let mut repo = MockUserAccountRepository::new();
    repo.expect_find_many().returning(move |ids| {
        Ok(accounts
            .iter()
            .filter(|account| ids.contains(&account.id))
            .cloned()
            .collect())
    });
    repo
}

fn service(
    items: MockItemRepository,
    users: MockUserAccountRepository,
) -> ItemService<MockItemRepository, MockUserAccountRepository> {
    ItemService::new(
        Arc::new(items),
        Arc::new(users),
        Arc::new(MutableClock::default()),
    )
}

#[rstest]
#[case(None, None, 0, 12)]
#[case(Some(0), Some(0), 0, 1)]
#[case(Some(3), Some(10), 20, 10)]
#[case(Some(2), Some(500), 50, 50)]
#[tokio::test]
async fn browse_normalises_paging(
    #[case] page: Option<u32>,
    #[case] limit: Option<u32>,
    #[case] expected_offset: u64,
    #[case] expected_limit: u64,
) {
    let mut items = MockItemRepository::new();
    items
        .expect_browse()
        .withf(move |query| query.offset == expected_offset && query.limit == expected_limit)
        .times(1)
        .returning(|_| Ok(ItemPage::default()));
    let service = service(items, users_returning(vec![]));

    let page = service
        .browse(BrowseItemsRequest {
            page,
            limit,
            ..BrowseItemsRequest::default()
        })
        .await
        .expect("browse succeeds");
    assert!(page.items.is_empty());
    assert_eq!(page.total_pages, 0);
}

#[rstest]
#[tokio::test]
async fn browse_reports_page_counts_and_owners() {
    let owner = account("owner", Role::User, 100);
    let listed = approved_item(owner.id, "Wool coat", 120);
    let mut items = MockItemRepository::new();
    let page_items = vec![listed.clone()];
    items.expect_browse().returning(move |_| {
        Ok(ItemPage {
            items: page_items.clone(),
            total: 25,
        })
    });
    let service = service(items, users_returning(vec![owner.clone()]));

    let page = service
        .browse(BrowseItemsRequest {
            page: Some(2),
            search: Some("   ".to_owned()),
            ..BrowseItemsRequest::default()
        })
        .await
        .expect("browse succeeds");
    assert_eq!(page.current_page, 2);
    assert_eq!(page.total_pages, 3);
    assert_eq!(
        page.items.first().map(|details| details.owner.id),
        Some(owner.id)
    );
}

#[rstest]
#[tokio::test]
async fn create_lists_item_as_pending() {
    let owner = account("owner", Role::User, 100);
    let mut items = MockItemRepository::new();
    items
        .expect_insert()
        .withf(|item| item.status == ItemStatus::Pending && item.is_available)
        .times(1)
        .returning(|_| Ok(()));
    let service = service(items, users_returning(vec![owner.clone()]));

    let created = service
        .create(&owner.id, draft("Denim jacket", 80))
        .await
        .expect("created");
    assert_eq!(created.item.owner_id, owner.id);
    assert_eq!(created.owner.id, owner.id);
}

#[rstest]
#[tokio::test]
async fn update_by_non_owner_is_forbidden() {
    let owner = account("owner", Role::User, 100);
    let other = account("other", Role::User, 100);
    let item = approved_item(owner.id, "Wool coat", 120);
    let item_id = item.id;
    let mut items = MockItemRepository::new();
    items
        .expect_find_by_id()
        .returning(move |_| Ok(Some(item.clone())));
    items.expect_update().never();
    let service = service(items, users_returning(vec![owner, other.clone()]));

    let err = service
        .update(&other.id, &item_id, draft("Wool coat", 130))
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[case(ItemStatus::Swapped)]
#[case(ItemStatus::Redeemed)]
#[tokio::test]
async fn settled_items_cannot_be_deleted(#[case] status: ItemStatus) {
    let owner = account("owner", Role::User, 100);
    let mut item = approved_item(owner.id, "Wool coat", 120);
    item.status = status;
    item.is_available = false;
    let item_id = item.id;
    let mut items = MockItemRepository::new();
    items
        .expect_find_by_id()
        .returning(move |_| Ok(Some(item.clone())));
    items.expect_delete().never();
    let service = service(items, users_returning(vec![owner.clone()]));

    let err = service
        .delete(&owner.id, &item_id)
        .await
        .expect_err("settled");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn get_missing_item_is_not_found() {
    let mut items = MockItemRepository::new();
    items.expect_find_by_id().returning(|_| Ok(None));
    let service = service(items, users_returning(vec![]));

    let err = service
        .get(&ItemId::random())
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn store_outages_surface_as_service_unavailable() {
    let mut items = MockItemRepository::new();
    items
        .expect_list_by_owner()
        .returning(|_| Err(ItemRepositoryError::connection("refused")));
    let service = service(items, users_returning(vec![]));

    let err = service
        .mine(&UserId::random())
        .await
        .expect_err("outage");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}
