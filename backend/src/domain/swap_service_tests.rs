//! Unit coverage for the swap engine against mocked repositories.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    MockItemRepository, MockSwapRepository, MockUserAccountRepository, SettlementReceipt,
};
use crate::domain::{ItemStatus, Role, SwapStatus, SwapType};
use crate::test_support::clock::MutableClock;
use crate::test_support::fixtures::{account, approved_item};

type TestService = SwapService<MockItemRepository, MockUserAccountRepository, MockSwapRepository>;

struct World {
    owner: UserAccount,
    requester: UserAccount,
    target: Item,
    offered: Item,
}

#[fixture]
fn world() -> World {
    let owner = account("owner", Role::User, 100);
    let requester = account("requester", Role::User, 200);
    let target = approved_item(owner.id, "Wool coat", 150);
    let offered = approved_item(requester.id, "Silk scarf", 40);
    World {
        owner,
        requester,
        target,
        offered,
    }
}

fn service(
    items: MockItemRepository,
    users: MockUserAccountRepository,
    swaps: MockSwapRepository,
) -> TestService {
    SwapService::new(
        Arc::new(items),
        Arc::new(users),
        Arc::new(swaps),
        Arc::new(MutableClock::default()),
    )
}

fn items_returning(items: Vec<Item>) -> MockItemRepository {
    let mut repo = MockItemRepository::new();
    let lookup = items.clone();
    repo.expect_find_by_id()
        .returning(move |id| Ok(lookup.iter().find(|item| &item.id == id).cloned()));
    repo.expect_find_many().returning(move |ids| {
        Ok(items
            .iter()
            .filter(|item| ids.contains(&item.id))
            .cloned()
            .collect())
    });
    repo
}

fn users_returning(users: Vec<UserAccount>) -> MockUserAccountRepository {
    let mut repo = MockUserAccountRepository::new();
    let lookup = users.clone();
    repo.expect_find_by_id()
        .returning(move |id| Ok(lookup.iter().find(|user| &user.id == id).cloned()));
    repo.expect_find_many().returning(move |ids| {
        Ok(users
            .iter()
            .filter(|user| ids.contains(&user.id))
            .cloned()
            .collect())
    });
    repo
}

fn points_request(world: &World, points: u32) -> NewSwapRequest {
    NewSwapRequest {
        requester_id: world.requester.id,
        item_requested_id: world.target.id,
        swap_type: SwapType::Points,
        item_offered_id: None,
        points_offered: Some(points),
        message: Some("  would love this  ".to_owned()),
    }
}

fn direct_request(world: &World, offered: ItemId) -> NewSwapRequest {
    NewSwapRequest {
        requester_id: world.requester.id,
        item_requested_id: world.target.id,
        swap_type: SwapType::Direct,
        item_offered_id: Some(offered),
        points_offered: None,
        message: None,
    }
}

fn pending_points_swap(world: &World, points: u32) -> SwapRequest {
    SwapRequest::propose(
        world.requester.id,
        world.target.id,
        SwapOffer::Points { points },
        None,
        crate::test_support::clock::fixture_timestamp(),
    )
}

fn everyone(world: &World) -> Vec<UserAccount> {
    vec![world.owner.clone(), world.requester.clone()]
}

fn both_items(world: &World) -> Vec<Item> {
    vec![world.target.clone(), world.offered.clone()]
}

#[rstest]
#[tokio::test]
async fn create_points_swap_persists_pending_request(world: World) {
    let mut swaps = MockSwapRepository::new();
    swaps.expect_has_pending().times(1).returning(|_, _| Ok(false));
    swaps.expect_insert_pending().times(1).returning(|_| Ok(()));
    let service = service(
        items_returning(both_items(&world)),
        users_returning(everyone(&world)),
        swaps,
    );

    let details = service
        .create_swap(points_request(&world, 150))
        .await
        .expect("swap created");

    assert_eq!(details.swap.status, SwapStatus::Pending);
    assert_eq!(details.swap.offer, SwapOffer::Points { points: 150 });
    assert_eq!(
        details.swap.message.as_ref().map(AsRef::as_ref),
        Some("would love this")
    );
    assert_eq!(details.requester.id, world.requester.id);
    assert_eq!(details.item_requested.owner.id, world.owner.id);
    assert!(details.item_offered.is_none());
}

#[rstest]
#[tokio::test]
async fn create_rejects_unavailable_target(mut world: World) {
    world.target.is_available = false;
    let service = service(
        items_returning(both_items(&world)),
        users_returning(everyone(&world)),
        MockSwapRepository::new(),
    );

    let err = service
        .create_swap(points_request(&world, 150))
        .await
        .expect_err("unavailable");
    assert_eq!(
        err,
        SwapError::NotAvailable {
            item_id: world.target.id
        }
    );
}

#[rstest]
#[tokio::test]
async fn create_treats_missing_target_as_unavailable(world: World) {
    let service = service(
        items_returning(vec![]),
        users_returning(everyone(&world)),
        MockSwapRepository::new(),
    );

    let err = service
        .create_swap(points_request(&world, 150))
        .await
        .expect_err("missing");
    assert!(matches!(err, SwapError::NotAvailable { .. }));
}

#[rstest]
#[case(SwapType::Points)]
#[case(SwapType::Direct)]
#[tokio::test]
async fn create_forbids_requesting_own_item(world: World, #[case] swap_type: SwapType) {
    let service = service(
        items_returning(both_items(&world)),
        users_returning(everyone(&world)),
        MockSwapRepository::new(),
    );
    let request = NewSwapRequest {
        requester_id: world.owner.id,
        ..match swap_type {
            SwapType::Points => points_request(&world, 150),
            SwapType::Direct => direct_request(&world, world.offered.id),
        }
    };

    let err = service.create_swap(request).await.expect_err("self swap");
    assert_eq!(err, SwapError::SelfSwapForbidden);
}

#[rstest]
#[tokio::test]
async fn create_rejects_foreign_offered_item(world: World) {
    let stranger = account("stranger", Role::User, 100);
    let foreign = approved_item(stranger.id, "Linen shirt", 30);
    let mut items = both_items(&world);
    items.push(foreign.clone());
    let service = service(
        items_returning(items),
        users_returning(everyone(&world)),
        MockSwapRepository::new(),
    );

    let err = service
        .create_swap(direct_request(&world, foreign.id))
        .await
        .expect_err("foreign offer");
    assert_eq!(err, SwapError::InvalidOffer { item_id: foreign.id });
}

#[rstest]
#[tokio::test]
async fn create_rejects_unavailable_offered_item(mut world: World) {
    world.offered.is_available = false;
    let service = service(
        items_returning(both_items(&world)),
        users_returning(everyone(&world)),
        MockSwapRepository::new(),
    );

    let err = service
        .create_swap(direct_request(&world, world.offered.id))
        .await
        .expect_err("unavailable offer");
    assert!(matches!(err, SwapError::InvalidOffer { .. }));
}

#[rstest]
#[tokio::test]
async fn create_rejects_under_offer(world: World) {
    let service = service(
        items_returning(both_items(&world)),
        users_returning(everyone(&world)),
        MockSwapRepository::new(),
    );

    let err = service
        .create_swap(points_request(&world, 149))
        .await
        .expect_err("under offer");
    assert_eq!(
        err,
        SwapError::InsufficientOffer {
            offered: 149,
            required: 150
        }
    );
}

#[rstest]
#[tokio::test]
async fn create_rejects_offer_above_balance(mut world: World) {
    world.requester.points = 100;
    let service = service(
        items_returning(both_items(&world)),
        users_returning(everyone(&world)),
        MockSwapRepository::new(),
    );

    let err = service
        .create_swap(points_request(&world, 150))
        .await
        .expect_err("insufficient balance");
    assert_eq!(
        err,
        SwapError::InsufficientBalance {
            balance: 100,
            offered: 150
        }
    );
}

#[rstest]
#[tokio::test]
async fn create_reports_existing_pending_request(world: World) {
    let mut swaps = MockSwapRepository::new();
    swaps.expect_has_pending().returning(|_, _| Ok(true));
    swaps.expect_insert_pending().never();
    let service = service(
        items_returning(both_items(&world)),
        users_returning(everyone(&world)),
        swaps,
    );

    let err = service
        .create_swap(points_request(&world, 150))
        .await
        .expect_err("duplicate");
    assert_eq!(err, SwapError::DuplicateRequest);
}

#[rstest]
#[tokio::test]
async fn create_maps_concurrent_duplicate_insert(world: World) {
    let mut swaps = MockSwapRepository::new();
    swaps.expect_has_pending().returning(|_, _| Ok(false));
    swaps
        .expect_insert_pending()
        .returning(|_| Err(SwapRepositoryError::duplicate_pending()));
    let service = service(
        items_returning(both_items(&world)),
        users_returning(everyone(&world)),
        swaps,
    );

    let err = service
        .create_swap(points_request(&world, 150))
        .await
        .expect_err("duplicate");
    assert_eq!(err, SwapError::DuplicateRequest);
}

#[rstest]
#[tokio::test]
async fn create_validates_shape_before_touching_stores(world: World) {
    let service = service(
        MockItemRepository::new(),
        MockUserAccountRepository::new(),
        MockSwapRepository::new(),
    );
    let request = NewSwapRequest {
        points_offered: None,
        ..points_request(&world, 150)
    };

    let err = service.create_swap(request).await.expect_err("shape");
    assert!(matches!(
        err,
        SwapError::Validation {
            field: "pointsOffered",
            ..
        }
    ));
}

#[rstest]
#[tokio::test]
async fn accept_settles_points_swap(world: World) {
    let swap = pending_points_swap(&world, 150);
    let swap_id = swap.id;
    let lookup = swap.clone();
    let mut swaps = MockSwapRepository::new();
    swaps
        .expect_find_by_id()
        .returning(move |_| Ok(Some(lookup.clone())));
    let owner_id = world.owner.id;
    let requester_id = world.requester.id;
    swaps
        .expect_settle()
        .withf(move |plan| {
            plan.points
                .is_some_and(|t| t.from == requester_id && t.to == owner_id && t.amount == 150)
                && plan.items.len() == 1
                && plan.items.iter().all(|i| i.new_status == ItemStatus::Redeemed)
        })
        .times(1)
        .returning(move |plan| {
            let mut settled = swap.clone();
            settled.status = SwapStatus::Accepted;
            settled.completed_at = Some(plan.completed_at);
            Ok(SettlementReceipt {
                swap: settled,
                rejected: vec![],
            })
        });
    let service = service(
        items_returning(both_items(&world)),
        users_returning(everyone(&world)),
        swaps,
    );

    let details = service
        .accept_swap(&world.owner.id, &swap_id)
        .await
        .expect("accepted");
    assert_eq!(details.swap.status, SwapStatus::Accepted);
    assert!(details.swap.completed_at.is_some());
}

#[rstest]
#[tokio::test]
async fn accept_requires_item_owner(world: World) {
    let swap = pending_points_swap(&world, 150);
    let swap_id = swap.id;
    let mut swaps = MockSwapRepository::new();
    swaps
        .expect_find_by_id()
        .returning(move |_| Ok(Some(swap.clone())));
    swaps.expect_settle().never();
    let service = service(
        items_returning(both_items(&world)),
        users_returning(everyone(&world)),
        swaps,
    );

    let err = service
        .accept_swap(&world.requester.id, &swap_id)
        .await
        .expect_err("not owner");
    assert_eq!(err, SwapError::NotAuthorized { action: "accept" });
}

#[rstest]
#[tokio::test]
async fn accept_on_terminal_swap_is_invalid_state(world: World) {
    let mut swap = pending_points_swap(&world, 150);
    swap.status = SwapStatus::Accepted;
    let swap_id = swap.id;
    let mut swaps = MockSwapRepository::new();
    swaps
        .expect_find_by_id()
        .returning(move |_| Ok(Some(swap.clone())));
    swaps.expect_settle().never();
    let service = service(
        items_returning(both_items(&world)),
        users_returning(everyone(&world)),
        swaps,
    );

    let err = service
        .accept_swap(&world.owner.id, &swap_id)
        .await
        .expect_err("already accepted");
    assert_eq!(
        err,
        SwapError::InvalidState {
            status: SwapStatus::Accepted,
            action: SwapAction::Accept
        }
    );
}

#[rstest]
#[tokio::test]
async fn accept_missing_swap_is_not_found(world: World) {
    let mut swaps = MockSwapRepository::new();
    swaps.expect_find_by_id().returning(|_| Ok(None));
    let service = service(
        items_returning(both_items(&world)),
        users_returning(everyone(&world)),
        swaps,
    );
    let swap_id = SwapId::random();

    let err = service
        .accept_swap(&world.owner.id, &swap_id)
        .await
        .expect_err("missing");
    assert_eq!(err, SwapError::SwapNotFound { swap_id });
}

#[rstest]
#[tokio::test]
async fn accept_that_loses_a_race_reports_invalid_state(world: World) {
    let swap = pending_points_swap(&world, 150);
    let swap_id = swap.id;
    let mut swaps = MockSwapRepository::new();
    let mut reads = 0;
    swaps.expect_find_by_id().returning(move |_| {
        reads += 1;
        let mut current = swap.clone();
        if reads > 1 {
            current.status = SwapStatus::Accepted;
        }
        Ok(Some(current))
    });
    swaps
        .expect_settle()
        .returning(|_| Err(SwapRepositoryError::not_pending()));
    let service = service(
        items_returning(both_items(&world)),
        users_returning(everyone(&world)),
        swaps,
    );

    let err = service
        .accept_swap(&world.owner.id, &swap_id)
        .await
        .expect_err("lost race");
    assert_eq!(
        err,
        SwapError::InvalidState {
            status: SwapStatus::Accepted,
            action: SwapAction::Accept
        }
    );
}

#[rstest]
#[case(
    SwapRepositoryError::insufficient_balance(10_u32),
    SwapError::InsufficientBalance { balance: 10, offered: 150 }
)]
#[case(
    SwapRepositoryError::connection("pool timed out"),
    SwapError::SettlementFailure {
        message: "swap repository connection failed: pool timed out".to_owned(),
        retryable: true,
    }
)]
#[case(
    SwapRepositoryError::query("deadlock"),
    SwapError::SettlementFailure {
        message: "swap repository query failed: deadlock".to_owned(),
        retryable: false,
    }
)]
#[tokio::test]
async fn accept_maps_settlement_failures(
    world: World,
    #[case] failure: SwapRepositoryError,
    #[case] expected: SwapError,
) {
    let swap = pending_points_swap(&world, 150);
    let swap_id = swap.id;
    let mut swaps = MockSwapRepository::new();
    swaps
        .expect_find_by_id()
        .returning(move |_| Ok(Some(swap.clone())));
    swaps
        .expect_settle()
        .returning(move |_| Err(failure.clone()));
    let service = service(
        items_returning(both_items(&world)),
        users_returning(everyone(&world)),
        swaps,
    );

    let err = service
        .accept_swap(&world.owner.id, &swap_id)
        .await
        .expect_err("settlement failed");
    assert_eq!(err, expected);
}

#[rstest]
#[tokio::test]
async fn reject_transitions_without_settlement(world: World) {
    let swap = pending_points_swap(&world, 150);
    let swap_id = swap.id;
    let lookup = swap.clone();
    let mut swaps = MockSwapRepository::new();
    swaps
        .expect_find_by_id()
        .returning(move |_| Ok(Some(lookup.clone())));
    swaps.expect_settle().never();
    swaps
        .expect_transition()
        .withf(|_, next, _| *next == SwapStatus::Rejected)
        .times(1)
        .returning(move |_, next, now| {
            let mut updated = swap.clone();
            updated.status = next;
            updated.updated_at = now;
            Ok(updated)
        });
    let service = service(
        items_returning(both_items(&world)),
        users_returning(everyone(&world)),
        swaps,
    );

    let details = service
        .reject_swap(&world.owner.id, &swap_id)
        .await
        .expect("rejected");
    assert_eq!(details.swap.status, SwapStatus::Rejected);
}

#[rstest]
#[tokio::test]
async fn cancel_by_non_requester_is_not_authorized(world: World) {
    let swap = pending_points_swap(&world, 150);
    let swap_id = swap.id;
    let mut swaps = MockSwapRepository::new();
    swaps
        .expect_find_by_id()
        .returning(move |_| Ok(Some(swap.clone())));
    swaps.expect_transition().never();
    let service = service(
        items_returning(both_items(&world)),
        users_returning(everyone(&world)),
        swaps,
    );

    let err = service
        .cancel_swap(&world.owner.id, &swap_id)
        .await
        .expect_err("owner cannot cancel");
    assert_eq!(err, SwapError::NotAuthorized { action: "cancel" });
}

#[rstest]
#[tokio::test]
async fn get_allows_admins_and_hides_from_strangers(world: World) {
    let admin = account("moderator", Role::Admin, 0);
    let stranger = account("stranger", Role::User, 0);
    let swap = pending_points_swap(&world, 150);
    let swap_id = swap.id;
    let mut swaps = MockSwapRepository::new();
    swaps
        .expect_find_by_id()
        .returning(move |_| Ok(Some(swap.clone())));
    let mut users = everyone(&world);
    users.push(admin.clone());
    users.push(stranger.clone());
    let service = service(
        items_returning(both_items(&world)),
        users_returning(users),
        swaps,
    );

    let seen = service
        .get_swap(&admin.id, &swap_id)
        .await
        .expect("admin may view");
    assert_eq!(seen.swap.id, swap_id);

    let err = service
        .get_swap(&stranger.id, &swap_id)
        .await
        .expect_err("stranger may not view");
    assert!(matches!(err, SwapError::NotAuthorized { .. }));
}

#[rstest]
#[tokio::test]
async fn list_uses_role_specific_query(world: World) {
    let swap = pending_points_swap(&world, 150);
    let mut swaps = MockSwapRepository::new();
    swaps.expect_list_by_requester().never();
    swaps
        .expect_list_for_owner()
        .times(1)
        .returning(move |_| Ok(vec![swap.clone()]));
    let service = service(
        items_returning(both_items(&world)),
        users_returning(everyone(&world)),
        swaps,
    );

    let listed = service
        .list_swaps(&world.owner.id, SwapRole::Owner)
        .await
        .expect("listed");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed.first().map(|d| d.requester.id), Some(world.requester.id));
}

#[rstest]
#[tokio::test]
async fn driving_port_carries_condition_codes(world: World) {
    let service = service(
        items_returning(both_items(&world)),
        users_returning(everyone(&world)),
        MockSwapRepository::new(),
    );

    let err = SwapCommand::create(&service, points_request(&world, 10))
        .await
        .expect_err("under offer");
    assert_eq!(err.code(), crate::domain::ErrorCode::InvalidRequest);
    assert_eq!(
        err.details().and_then(|d| d.get("code")),
        Some(&serde_json::json!("insufficient_offer"))
    );
}
