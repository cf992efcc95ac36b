//! Unit coverage for admin gating, moderation transitions and statistics.

use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{
    ItemCounts, MockItemRepository, MockSwapRepository, MockUserAccountRepository, SwapCounts,
};
use crate::test_support::clock::MutableClock;
use crate::test_support::fixtures::{account, approved_item};

type TestService =
    ModerationService<MockItemRepository, MockUserAccountRepository, MockSwapRepository>;

fn users_returning(accounts: Vec<UserAccount>) -> MockUserAccountRepository {
    let mut repo = MockUserAccountRepository::new();
    let lookup = accounts.clone();
    repo.expect_find_by_id()
        .returning(move |id| Ok(lookup.iter().find(|a| &a.id == id).cloned()));
    repo.expect_find_many().returning(move |ids| {
        Ok(accounts
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    });
    repo
}

fn service(
    items: MockItemRepository,
    users: MockUserAccountRepository,
    swaps: MockSwapRepository,
) -> TestService {
    ModerationService::new(
        Arc::new(items),
        Arc::new(users),
        Arc::new(swaps),
        Arc::new(MutableClock::default()),
    )
}

#[rstest]
#[case(1, 3, 33.3)]
#[case(2, 3, 66.7)]
#[case(1, 2, 50.0)]
#[case(0, 7, 0.0)]
#[case(4, 0, 0.0)]
#[case(10, 10, 100.0)]
#[case(u64::MAX, u64::MAX, 100.0)]
#[case(u64::MAX / 3, u64::MAX, 33.3)]
fn percentages_round_to_one_decimal(#[case] part: u64, #[case] whole: u64, #[case] expected: f64) {
    assert!((percentage(part, whole) - expected).abs() < f64::EPSILON);
}

#[rstest]
#[tokio::test]
async fn non_admins_are_forbidden() {
    let member = account("member", Role::User, 100);
    let service = service(
        MockItemRepository::new(),
        users_returning(vec![member.clone()]),
        MockSwapRepository::new(),
    );

    let err = service.stats(&member.id).await.expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn approve_moves_pending_item() {
    let admin = account("moderator", Role::Admin, 100);
    let owner = account("owner", Role::User, 100);
    let mut pending = approved_item(owner.id, "Wool coat", 120);
    pending.status = ItemStatus::Pending;
    let item_id = pending.id;
    let mut items = MockItemRepository::new();
    items
        .expect_find_by_id()
        .returning(move |_| Ok(Some(pending.clone())));
    items
        .expect_set_status()
        .withf(|_, expected, next, _| {
            *expected == ItemStatus::Pending && *next == ItemStatus::Approved
        })
        .times(1)
        .returning(|_, _, _, _| Ok(true));
    let service = service(
        items,
        users_returning(vec![admin.clone(), owner]),
        MockSwapRepository::new(),
    );

    let moderated = service
        .approve_item(&admin.id, &item_id)
        .await
        .expect("approved");
    assert_eq!(moderated.item.status, ItemStatus::Approved);
}

#[rstest]
#[tokio::test]
async fn moderating_non_pending_item_is_a_conflict() {
    let admin = account("moderator", Role::Admin, 100);
    let item = approved_item(admin.id, "Wool coat", 120);
    let item_id = item.id;
    let mut items = MockItemRepository::new();
    items
        .expect_find_by_id()
        .returning(move |_| Ok(Some(item.clone())));
    items.expect_set_status().never();
    let service = service(
        items,
        users_returning(vec![admin.clone()]),
        MockSwapRepository::new(),
    );

    let err = service
        .reject_item(&admin.id, &item_id)
        .await
        .expect_err("already approved");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn admins_cannot_demote_themselves() {
    let admin = account("moderator", Role::Admin, 100);
    let mut users = users_returning(vec![admin.clone()]);
    users.expect_set_role().never();
    let service = service(MockItemRepository::new(), users, MockSwapRepository::new());

    let err = service
        .set_role(&admin.id, &admin.id, Role::User)
        .await
        .expect_err("self demotion");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn stats_combine_repository_counts() {
    let admin = account("moderator", Role::Admin, 100);
    let mut users = users_returning(vec![admin.clone()]);
    users.expect_count().returning(|| Ok(4));
    let mut items = MockItemRepository::new();
    items.expect_counts().returning(|| {
        Ok(ItemCounts {
            total: 3,
            pending: 1,
            approved: 2,
        })
    });
    let mut swaps = MockSwapRepository::new();
    swaps
        .expect_counts()
        .returning(|| Ok(SwapCounts { total: 0, accepted: 0 }));
    let service = service(items, users, swaps);

    let stats = service.stats(&admin.id).await.expect("stats");
    assert_eq!(stats.total_users, 4);
    assert_eq!(stats.pending_items, 1);
    assert!((stats.approval_rate - 66.7).abs() < f64::EPSILON);
    assert!(stats.swap_success_rate.abs() < f64::EPSILON);
}
