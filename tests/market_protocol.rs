//! Integration tests for the transfer protocol: quorum verification,
//! block rotation, tamper detection and conservation of supply.

use marketchain::account::Account;
use marketchain::block::Block;
use marketchain::config::MarketConfig;
use marketchain::crypto::Address;
use marketchain::error::ChainError;
use marketchain::exchange::Amount;
use marketchain::ledger::Ledger;
use marketchain::market::Market;
use marketchain::validator::Validator;

const SEED: u64 = 42;

/// Market with the documented reference scenario: balances 500 and 800,
/// five validators, quorum 3, block capacity 4.
fn scenario_market() -> (Market, Address, Address) {
    let ledger = Ledger::new(Block::origin(4));
    let mut market = Market::with_rng_seed(ledger, MarketConfig::default(), SEED).unwrap();
    let a = market
        .add_account(Account::new("Marcy", Amount::from_num(500)))
        .unwrap();
    let b = market
        .add_account(Account::new("David", Amount::from_num(800)))
        .unwrap();
    for id in 1..=5 {
        market.register_validator(id).unwrap();
    }
    (market, a, b)
}

#[test]
fn end_to_end_transfer() {
    let (mut market, a, b) = scenario_market();

    let receipt = market.transfer(a, b, Amount::from_num(300)).unwrap();

    assert_eq!(market.balance_of(&a), Some(Amount::from_num(200)));
    assert_eq!(market.balance_of(&b), Some(Amount::from_num(1100)));

    // One exchange sits in the open block, which is still the origin block.
    let head = market.ledger().head_block();
    assert_eq!(head.len(), 1);
    assert!(!head.is_sealed());
    assert_eq!(receipt.block_hash, head.hash);

    // Exactly three distinct validators approved.
    assert_eq!(receipt.validators.len(), 3);
    let mut ids = receipt.validators.clone();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3);

    // Both parties hold a replica of the committed exchange.
    assert!(market.account(&a).unwrap().history.contains_key(&receipt.exchange_id));
    assert!(market.account(&b).unwrap().history.contains_key(&receipt.exchange_id));
}

#[test]
fn total_supply_is_conserved() {
    let (mut market, a, b) = scenario_market();
    let c = market
        .add_account(Account::new("Charles", Amount::from_num(400)))
        .unwrap();
    let initial = market.total_supply();
    assert_eq!(initial, Amount::from_num(1700));

    let mut amount = Amount::from_num(25);
    for (from, to) in [(a, b), (b, c), (c, a), (a, c), (c, b), (b, a)] {
        market.transfer(from, to, amount).unwrap();
        assert_eq!(market.total_supply(), initial);
        amount /= Amount::from_num(4);
    }
}

#[test]
fn rejection_leaves_state_unchanged() {
    let (mut market, a, b) = scenario_market();
    market.transfer(a, b, Amount::from_num(100)).unwrap();

    let balance_a = market.balance_of(&a).unwrap();
    let balance_b = market.balance_of(&b).unwrap();
    let history_a = market.account(&a).unwrap().history.clone();
    let history_b = market.account(&b).unwrap().history.clone();
    let open_len = market.ledger().head_block().len();
    let ledger_len = market.ledger().len();

    // Self-transfer, overdraft and negative amount must each change nothing.
    assert!(market.transfer(a, a, Amount::from_num(10)).is_err());
    assert!(market.transfer(a, b, Amount::from_num(10_000)).is_err());
    assert!(market.transfer(a, b, Amount::from_num(-5)).is_err());

    assert_eq!(market.balance_of(&a).unwrap(), balance_a);
    assert_eq!(market.balance_of(&b).unwrap(), balance_b);
    assert_eq!(market.account(&a).unwrap().history, history_a);
    assert_eq!(market.account(&b).unwrap().history, history_b);
    assert_eq!(market.ledger().head_block().len(), open_len);
    assert_eq!(market.ledger().len(), ledger_len);
}

#[test]
fn quorum_fails_fast_on_one_stale_snapshot() {
    let account_a = Account::new("a", Amount::from_num(500));
    let account_b = Account::new("b", Amount::from_num(500));
    let a = account_a.address;
    let b = account_b.address;

    // A ledger that already carries one committed exchange from `a`.
    let mut ledger = Ledger::new(Block::origin(4));
    let committed = marketchain::exchange::Exchange::new(
        a,
        b,
        Amount::from_num(50),
        ledger.head_hash(),
        0,
    );
    ledger.append_to_head(committed.clone()).unwrap();

    // The stale snapshot was frozen before that commit.
    let stale_snapshot = Ledger::new(Block::origin(4));

    // Pool of exactly quorum size, so all three are always sampled.
    let current = ledger.clone();
    let mut market = Market::with_rng_seed(ledger, MarketConfig::default(), SEED).unwrap();
    market.add_account(account_a).unwrap();
    market.add_account(account_b).unwrap();
    market.add_validator(Validator::new(1, current.clone())).unwrap();
    market.add_validator(Validator::new(2, current)).unwrap();
    market.add_validator(Validator::new(3, stale_snapshot)).unwrap();

    // The sender's claimed history holds the committed exchange, which
    // validators 1 and 2 can see but validator 3 cannot.
    market.account_mut(&a).unwrap().record(committed).unwrap();

    let history_a = market.account(&a).unwrap().history.clone();
    let history_b = market.account(&b).unwrap().history.clone();
    let open_len = market.ledger().head_block().len();

    let err = market.transfer(a, b, Amount::from_num(10)).unwrap_err();
    assert!(matches!(err, ChainError::QuorumDenied(_)));

    // A denial mutates nothing: balances, histories, open block.
    assert_eq!(market.balance_of(&a), Some(Amount::from_num(500)));
    assert_eq!(market.balance_of(&b), Some(Amount::from_num(500)));
    assert_eq!(market.account(&a).unwrap().history, history_a);
    assert_eq!(market.account(&b).unwrap().history, history_b);
    assert_eq!(market.ledger().head_block().len(), open_len);
}

#[test]
fn block_rotation_seals_exactly_one_block() {
    let (mut market, a, b) = scenario_market();
    let origin_hash = market.ledger().head_hash();

    // Capacity is 4: four commits fill and seal the origin block and open a
    // fresh empty head in the same call as the fourth append.
    for _ in 0..4 {
        market.transfer(a, b, Amount::from_num(10)).unwrap();
    }

    assert_eq!(market.ledger().len(), 2);
    let sealed = market.ledger().block(&origin_hash).unwrap();
    assert!(sealed.is_sealed());
    assert_eq!(sealed.len(), 4);
    // The sealed block's content hash is its key and never moved.
    assert_eq!(sealed.hash, origin_hash);

    let head = market.ledger().head_block();
    assert!(head.is_empty());
    assert!(!head.is_sealed());
    assert_eq!(head.parent_hash, origin_hash);

    // The next commit lands in the new head.
    let receipt = market.transfer(a, b, Amount::from_num(10)).unwrap();
    assert_eq!(receipt.block_hash, market.ledger().head_hash());
    assert_eq!(market.ledger().head_block().len(), 1);
}

#[test]
fn rotation_propagates_to_validator_snapshots() {
    let (mut market, a, b) = scenario_market();
    for _ in 0..5 {
        market.transfer(a, b, Amount::from_num(10)).unwrap();
    }
    // Every snapshot followed the rotation and the post-rotation commit, so
    // further transfers keep verifying.
    for id in 1..=5 {
        assert_eq!(market.validator(id).unwrap().snapshot().len(), 2);
    }
    assert!(market.transfer(b, a, Amount::from_num(5)).is_ok());
}

#[test]
fn commit_survives_a_broken_validator_snapshot() {
    let account_a = Account::new("a", Amount::from_num(500));
    let account_b = Account::new("b", Amount::from_num(500));
    let a = account_a.address;
    let b = account_b.address;

    let ledger = Ledger::new(Block::origin(4));
    let current = ledger.clone();
    // Validator 3's snapshot has a sealed head, so it cannot take the
    // post-commit propagation.
    let mut sealed_snapshot = ledger.clone();
    sealed_snapshot.seal_head();

    // Pool of exactly quorum size, so all three are always sampled.
    let mut market = Market::with_rng_seed(ledger, MarketConfig::default(), SEED).unwrap();
    market.add_account(account_a).unwrap();
    market.add_account(account_b).unwrap();
    market.add_validator(Validator::new(1, current.clone())).unwrap();
    market.add_validator(Validator::new(2, current)).unwrap();
    market.add_validator(Validator::new(3, sealed_snapshot)).unwrap();

    // Empty sender history, so all three approve and the transfer commits.
    // The failed propagation to validator 3 must not unwind it.
    let receipt = market.transfer(a, b, Amount::from_num(100)).unwrap();
    assert_eq!(market.balance_of(&a), Some(Amount::from_num(400)));
    assert_eq!(market.balance_of(&b), Some(Amount::from_num(600)));
    assert_eq!(market.ledger().head_block().len(), 1);
    assert!(market.account(&a).unwrap().history.contains_key(&receipt.exchange_id));

    // Validator 3 fell behind instead: it lacks the committed exchange, so
    // the sender's next transfer is denied, with state intact once more.
    let err = market.transfer(a, b, Amount::from_num(10)).unwrap_err();
    assert!(matches!(err, ChainError::QuorumDenied(_)));
    assert_eq!(market.balance_of(&a), Some(Amount::from_num(400)));
}

#[test]
fn tampered_history_is_denied() {
    let (mut market, a, b) = scenario_market();
    let receipt = market.transfer(a, b, Amount::from_num(100)).unwrap();

    // The sender quietly inflates its own replica of the committed
    // exchange; validator snapshots still hold the canonical amount.
    {
        let account = market.account_mut(&a).unwrap();
        let replica = account.history.get_mut(&receipt.exchange_id).unwrap();
        replica.amount += Amount::from_num(500);
        account.balance += Amount::from_num(500);
    }

    let err = market.transfer(a, b, Amount::from_num(10)).unwrap_err();
    assert!(matches!(err, ChainError::QuorumDenied(_)));

    // The receiver's untouched replica still verifies.
    assert!(market.transfer(b, a, Amount::from_num(10)).is_ok());
}

#[test]
fn canonical_copy_is_isolated_from_replicas() {
    let (mut market, a, b) = scenario_market();
    let receipt = market.transfer(a, b, Amount::from_num(100)).unwrap();

    market
        .account_mut(&a)
        .unwrap()
        .history
        .get_mut(&receipt.exchange_id)
        .unwrap()
        .amount = Amount::from_num(999);

    let canonical = market
        .ledger()
        .lookup_exchange(&receipt.block_hash, &receipt.exchange_id)
        .unwrap();
    assert_eq!(canonical.amount, Amount::from_num(100));
}

#[test]
fn fractional_transfers_settle_exactly() {
    let (mut market, a, b) = scenario_market();
    market.transfer(a, b, Amount::from_num(0.25)).unwrap();
    market.transfer(a, b, Amount::from_num(0.25)).unwrap();
    assert_eq!(market.balance_of(&a), Some(Amount::from_num(499.5)));
    assert_eq!(market.balance_of(&b), Some(Amount::from_num(800.5)));
    assert_eq!(market.total_supply(), Amount::from_num(1300));
}
