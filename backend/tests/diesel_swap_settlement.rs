//! Integration tests for the Diesel adapters against embedded PostgreSQL.
//!
//! Opt in with `RUN_PG_EMBEDDED=1`. The swap engine runs on top of the
//! Diesel repositories so settlement is checked end to end, including the
//! conditional updates that keep balances from going negative.

use std::sync::Arc;

use rewear_backend::domain::ports::{ItemRepository, NewSwapRequest, UserAccountRepository};
use rewear_backend::domain::{
    Item, ItemStatus, Role, SwapError, SwapId, SwapService, SwapStatus, SwapType, UserAccount,
};
use rewear_backend::outbound::persistence::{
    DbPool, DieselItemRepository, DieselSwapRepository, DieselUserAccountRepository, PoolConfig,
};
use rewear_backend::test_support::clock::MutableClock;
use rewear_backend::test_support::fixtures::{account, approved_item};
use rstest::rstest;
use tokio::runtime::Runtime;

mod support;

type Engine = SwapService<DieselItemRepository, DieselUserAccountRepository, DieselSwapRepository>;

struct Context {
    runtime: Runtime,
    items: Arc<DieselItemRepository>,
    users: Arc<DieselUserAccountRepository>,
    engine: Engine,
}

impl Context {
    fn new(database_url: &str) -> Self {
        let runtime = Runtime::new().expect("create runtime");
        let config = PoolConfig::new(database_url)
            .with_max_size(4)
            .with_min_idle(Some(1));
        let pool = runtime
            .block_on(DbPool::new(config))
            .expect("create pool");
        let items = Arc::new(DieselItemRepository::new(pool.clone()));
        let users = Arc::new(DieselUserAccountRepository::new(pool.clone()));
        let swaps = Arc::new(DieselSwapRepository::new(pool));
        let engine = SwapService::new(
            items.clone(),
            users.clone(),
            swaps,
            Arc::new(MutableClock::default()),
        );
        Self {
            runtime,
            items,
            users,
            engine,
        }
    }

    fn member(&self, username: &str, points: u32) -> UserAccount {
        let user = account(username, Role::User, points);
        self.runtime
            .block_on(self.users.insert(&user))
            .expect("insert account");
        user
    }

    fn listing(&self, owner: &UserAccount, title: &str, points: u32) -> Item {
        let item = approved_item(owner.id, title, points);
        self.runtime
            .block_on(self.items.insert(&item))
            .expect("insert item");
        item
    }

    fn offer(&self, requester: &UserAccount, item: &Item, points: u32) -> SwapId {
        let request = NewSwapRequest {
            requester_id: requester.id,
            item_requested_id: item.id,
            swap_type: SwapType::Points,
            item_offered_id: None,
            points_offered: Some(points),
            message: None,
        };
        self.runtime
            .block_on(self.engine.create_swap(request))
            .expect("create swap")
            .swap
            .id
    }

    fn points(&self, user: &UserAccount) -> u32 {
        self.runtime
            .block_on(self.users.find_by_id(&user.id))
            .expect("find account")
            .expect("account exists")
            .points
    }

    fn item(&self, item: &Item) -> Item {
        self.runtime
            .block_on(self.items.find_by_id(&item.id))
            .expect("find item")
            .expect("item exists")
    }
}

fn context() -> Option<Context> {
    support::database_or_skip().map(|url| Context::new(&url))
}

#[rstest]
fn points_settlement_commits_every_effect() {
    let Some(ctx) = context() else {
        return;
    };
    let ada = ctx.member("ada", 100);
    let bob = ctx.member("bob", 200);
    let carol = ctx.member("carol", 200);
    let coat = ctx.listing(&ada, "Wool coat", 150);
    let winning = ctx.offer(&bob, &coat, 150);
    let competing = ctx.offer(&carol, &coat, 160);

    let settled = ctx
        .runtime
        .block_on(ctx.engine.accept_swap(&ada.id, &winning))
        .expect("accept swap");

    assert_eq!(settled.swap.status, SwapStatus::Accepted);
    assert_eq!(ctx.points(&bob), 50);
    assert_eq!(ctx.points(&ada), 250);
    assert_eq!(ctx.points(&carol), 200);
    let coat = ctx.item(&coat);
    assert_eq!(coat.status, ItemStatus::Redeemed);
    assert!(!coat.is_available);

    let rival = ctx
        .runtime
        .block_on(ctx.engine.get_swap(&carol.id, &competing))
        .expect("get competing swap");
    assert_eq!(rival.swap.status, SwapStatus::Rejected);
}

#[rstest]
fn settlement_rolls_back_when_the_balance_is_spent() {
    let Some(ctx) = context() else {
        return;
    };
    let ada = ctx.member("ada", 0);
    let carol = ctx.member("carol", 0);
    let bob = ctx.member("bob", 150);
    let coat = ctx.listing(&ada, "Wool coat", 100);
    let scarf = ctx.listing(&carol, "Silk scarf", 100);
    let for_coat = ctx.offer(&bob, &coat, 100);
    let for_scarf = ctx.offer(&bob, &scarf, 100);

    ctx.runtime
        .block_on(ctx.engine.accept_swap(&ada.id, &for_coat))
        .expect("first acceptance settles");
    let error = ctx
        .runtime
        .block_on(ctx.engine.accept_swap(&carol.id, &for_scarf))
        .expect_err("second acceptance must fail");

    assert!(
        matches!(error, SwapError::InsufficientBalance { balance: 50, .. }),
        "{error}"
    );
    assert_eq!(ctx.points(&bob), 50);
    assert_eq!(ctx.points(&carol), 0);
    let scarf = ctx.item(&scarf);
    assert_eq!(scarf.status, ItemStatus::Approved);
    assert!(scarf.is_available);
    let pending = ctx
        .runtime
        .block_on(ctx.engine.get_swap(&carol.id, &for_scarf))
        .expect("get pending swap");
    assert_eq!(pending.swap.status, SwapStatus::Pending);
}
