#![no_std]
#![deny(unsafe_code)]
#![deny(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, log, symbol_short, token, Address, Env,
    Symbol, Vec,
};

/// Centralized contract error codes. Missing signatures are signaled by host panic (require_auth).
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
#[repr(u32)]
pub enum CrowdsaleError {
    /// Caller is not the owner for an owner-only operation.
    Unauthorized = 1,
    /// Buyer is not on the whitelist.
    NotWhitelisted = 2,
    /// Purchase attempted before `start_time` or after `end_time`.
    OutsideSaleWindow = 3,
    /// Purchase or admin edit attempted after finalize.
    AlreadyClosed = 4,
    /// Requested amount below the minimum, or cumulative amount above the maximum.
    ContributionOutOfBounds = 5,
    /// Attached value does not equal the cost of the requested tokens.
    InsufficientPayment = 6,
    /// `finalize` was already called.
    AlreadyFinalized = 7,
    /// Refunds are unavailable because the funding goal was reached.
    GoalReachedNoRefund = 8,
    /// Caller has no recorded payment to refund.
    NothingToRefund = 9,
    /// Token custody or the value vault could not cover an outbound transfer.
    TransferFailed = 10,
    /// `initialize` was already called.
    AlreadyInitialized = 11,
    /// Contract has not been initialized.
    NotInitialized = 12,
    /// Sale configuration violates a construction invariant.
    InvalidConfig = 13,
    /// Amount is zero, negative, or otherwise out of the accepted range.
    InvalidAmount = 14,
    /// Purchase would push cumulative tokens sold above `max_tokens`.
    MaxTokensExceeded = 15,
    /// `finalize` attempted while the sale window is still running.
    SaleStillOpen = 16,
    /// Refund attempted before the sale was finalized.
    SaleNotFinalized = 17,
    /// Checked arithmetic overflowed.
    ArithmeticOverflow = 18,
    /// Custody holds no sale tokens to withdraw.
    NothingToWithdraw = 19,
}

// ── Event symbols ────────────────────────────────────────────
const EVENT_INIT: Symbol = symbol_short!("init");
const EVENT_PURCHASE: Symbol = symbol_short!("purchase");
const EVENT_FINALIZE: Symbol = symbol_short!("finalize");
const EVENT_REFUND: Symbol = symbol_short!("refund");
const EVENT_PRICE_SET: Symbol = symbol_short!("price_set");
const EVENT_WL_ADD: Symbol = symbol_short!("wl_add");
const EVENT_WL_REM: Symbol = symbol_short!("wl_rem");
const EVENT_UNSOLD_WD: Symbol = symbol_short!("unsold_wd");

/// Fixed-point scale for prices: `PRICE_SCALE` means one value unit per token unit.
pub const PRICE_SCALE: i128 = 10_000_000;

/// Maximum number of addresses accepted by a single batch whitelist call.
const MAX_WHITELIST_BATCH: u32 = 50;

// ── Data structures ──────────────────────────────────────────
/// Contract version identifier. Bumped when storage or semantics change.
pub const CONTRACT_VERSION: u32 = 1;

/// What happens to unsold inventory when the funding goal is missed.
#[contracttype]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnsoldTokenPolicy {
    /// Unsold tokens return to the owner whether or not the goal was met.
    SweepAlways = 0,
    /// Unsold tokens stay in custody when the goal was missed, until the
    /// owner calls `withdraw_unsold`.
    SweepOnSuccess = 1,
}

/// Immutable sale parameters, fixed at `initialize`.
///
/// `price` is the initial price in value units per token unit, scaled by
/// `PRICE_SCALE`. Contribution bounds are in token units, `funding_goal` in
/// value units.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct SaleConfig {
    pub token: Address,
    pub payment_asset: Address,
    pub price: i128,
    pub max_tokens: i128,
    pub start_time: u64,
    pub end_time: u64,
    pub min_contribution: i128,
    pub max_contribution: i128,
    pub funding_goal: i128,
    pub unsold_policy: UnsoldTokenPolicy,
}

/// Per-participant running totals: tokens delivered and value paid.
#[contracttype]
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Contribution {
    pub tokens: i128,
    pub paid: i128,
}

/// Lifecycle position of the sale as seen at the current ledger time.
#[contracttype]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaleStatus {
    Pending = 0,
    Open = 1,
    /// Window elapsed (or sold out) but `finalize` not yet called.
    Ended = 2,
    ClosedGoalMet = 3,
    ClosedGoalUnmet = 4,
}

/// Settlement recorded by `finalize`.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct SaleOutcome {
    pub goal_reached: bool,
    pub tokens_swept: i128,
    pub value_swept: i128,
    pub finalized_at: u64,
}

/// Storage keys. Scalars describe the single sale instance; per-address
/// entries hold whitelist membership and contributions.
#[contracttype]
pub enum DataKey {
    /// Immutable `SaleConfig`.
    Config,
    /// Sale owner; authorizes admin operations and receives sweeps.
    Owner,
    /// Current price (seeded from config, replaced by `set_price`).
    Price,
    /// Cumulative tokens delivered to buyers.
    TokensSold,
    /// Cumulative value received. Never decremented, not even by refunds.
    TotalRaised,
    /// Value currently held on behalf of the sale.
    VaultBalance,
    /// Set once by `finalize`.
    Closed,
    /// `SaleOutcome` recorded by `finalize`.
    Outcome,
    /// Whitelist membership flag per address.
    Whitelisted(Address),
    /// Number of whitelisted addresses.
    WhitelistCount,
    /// `Contribution` per buyer.
    Contribution(Address),
}

// ── Contract ─────────────────────────────────────────────────
#[contract]
pub struct Crowdsale;

#[contractimpl]
impl Crowdsale {
    fn read_i128(env: &Env, key: &DataKey) -> i128 {
        env.storage().persistent().get(key).unwrap_or(0)
    }

    fn load_config(env: &Env) -> Result<SaleConfig, CrowdsaleError> {
        env.storage()
            .persistent()
            .get(&DataKey::Config)
            .ok_or(CrowdsaleError::NotInitialized)
    }

    fn load_owner(env: &Env) -> Result<Address, CrowdsaleError> {
        env.storage()
            .persistent()
            .get(&DataKey::Owner)
            .ok_or(CrowdsaleError::NotInitialized)
    }

    /// Require `caller` to sign and to be the owner. Returns the owner.
    fn require_owner(env: &Env, caller: &Address) -> Result<Address, CrowdsaleError> {
        caller.require_auth();
        let owner = Self::load_owner(env)?;
        if *caller != owner {
            return Err(CrowdsaleError::Unauthorized);
        }
        Ok(owner)
    }

    fn require_not_closed(env: &Env) -> Result<(), CrowdsaleError> {
        if Self::crowdsale_closed(env.clone()) {
            return Err(CrowdsaleError::AlreadyClosed);
        }
        Ok(())
    }

    /// Exact cost of `tokens` at `price`. Fractional costs are rejected so that
    /// value and token amounts always agree.
    fn cost_of(tokens: i128, price: i128) -> Result<i128, CrowdsaleError> {
        let raw = tokens
            .checked_mul(price)
            .ok_or(CrowdsaleError::ArithmeticOverflow)?;
        if raw % PRICE_SCALE != 0 {
            return Err(CrowdsaleError::InsufficientPayment);
        }
        Ok(raw / PRICE_SCALE)
    }

    fn validate_config(config: &SaleConfig) -> Result<(), CrowdsaleError> {
        if config.start_time >= config.end_time
            || config.price <= 0
            || config.max_tokens <= 0
            || config.min_contribution <= 0
            || config.min_contribution > config.max_contribution
            || config.funding_goal < 0
            || config.token == config.payment_asset
        {
            return Err(CrowdsaleError::InvalidConfig);
        }
        Ok(())
    }

    /// Move `amount` of `asset` out of the contract. A balance that cannot
    /// cover the transfer, or a declining asset contract, fails the call.
    fn send(
        env: &Env,
        asset: &Address,
        to: &Address,
        amount: i128,
    ) -> Result<(), CrowdsaleError> {
        let contract_addr = env.current_contract_address();
        match token::Client::new(env, asset).try_transfer(&contract_addr, to, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => Err(CrowdsaleError::TransferFailed),
        }
    }

    /// Pull `amount` of `asset` from `from` into the contract.
    fn receive(
        env: &Env,
        asset: &Address,
        from: &Address,
        amount: i128,
    ) -> Result<(), CrowdsaleError> {
        let contract_addr = env.current_contract_address();
        match token::Client::new(env, asset).try_transfer(from, &contract_addr, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => Err(CrowdsaleError::TransferFailed),
        }
    }

    /// Create the sale. Can only be called once; `owner` must authorize.
    pub fn initialize(env: Env, owner: Address, config: SaleConfig) -> Result<(), CrowdsaleError> {
        if env.storage().persistent().has(&DataKey::Config) {
            return Err(CrowdsaleError::AlreadyInitialized);
        }
        owner.require_auth();
        Self::validate_config(&config)?;

        let storage = env.storage().persistent();
        storage.set(&DataKey::Config, &config);
        storage.set(&DataKey::Owner, &owner);
        storage.set(&DataKey::Price, &config.price);
        storage.set(&DataKey::TokensSold, &0_i128);
        storage.set(&DataKey::TotalRaised, &0_i128);
        storage.set(&DataKey::VaultBalance, &0_i128);
        storage.set(&DataKey::Closed, &false);
        storage.set(&DataKey::WhitelistCount, &0_u32);

        env.events().publish(
            (EVENT_INIT, owner),
            (
                config.token,
                config.payment_asset,
                config.price,
                config.max_tokens,
                config.funding_goal,
            ),
        );
        Ok(())
    }

    // ── Purchase path ─────────────────────────────────────────

    /// Buy exactly `tokens` token units, paying `value` of the payment asset.
    ///
    /// The requested token amount is authoritative: `value` must equal
    /// `tokens * price / PRICE_SCALE` exactly. Preconditions are checked in a
    /// fixed order so each failure maps to a single error:
    /// whitelist, window, closed, contribution bounds, sale cap, payment,
    /// custody.
    pub fn buy(env: Env, buyer: Address, tokens: i128, value: i128) -> Result<(), CrowdsaleError> {
        buyer.require_auth();
        Self::purchase(&env, &buyer, tokens, value)
    }

    /// Buy with a bare value transfer. Tokens credited are
    /// `floor(value * PRICE_SCALE / price)`, and that amount must cost exactly
    /// `value`; any remainder fails with `InsufficientPayment`.
    /// Returns the number of tokens delivered.
    pub fn buy_with_value(env: Env, buyer: Address, value: i128) -> Result<i128, CrowdsaleError> {
        buyer.require_auth();
        Self::load_config(&env)?;
        // Non-positive value floors to zero tokens and fails the bounds check.
        let price = Self::price(env.clone());
        let tokens = value
            .checked_mul(PRICE_SCALE)
            .ok_or(CrowdsaleError::ArithmeticOverflow)?
            / price;
        Self::purchase(&env, &buyer, tokens, value)?;
        Ok(tokens)
    }

    fn purchase(
        env: &Env,
        buyer: &Address,
        tokens: i128,
        value: i128,
    ) -> Result<(), CrowdsaleError> {
        let config = Self::load_config(env)?;

        // Checks
        if !Self::is_whitelisted(env.clone(), buyer.clone()) {
            return Err(CrowdsaleError::NotWhitelisted);
        }
        let now = env.ledger().timestamp();
        if now < config.start_time || now > config.end_time {
            return Err(CrowdsaleError::OutsideSaleWindow);
        }
        Self::require_not_closed(env)?;

        let contribution_key = DataKey::Contribution(buyer.clone());
        let mut contribution: Contribution = env
            .storage()
            .persistent()
            .get(&contribution_key)
            .unwrap_or_default();
        let new_total = contribution
            .tokens
            .checked_add(tokens)
            .ok_or(CrowdsaleError::ArithmeticOverflow)?;
        if tokens < config.min_contribution || new_total > config.max_contribution {
            return Err(CrowdsaleError::ContributionOutOfBounds);
        }

        let sold = Self::read_i128(env, &DataKey::TokensSold);
        let new_sold = sold
            .checked_add(tokens)
            .ok_or(CrowdsaleError::ArithmeticOverflow)?;
        if new_sold > config.max_tokens {
            return Err(CrowdsaleError::MaxTokensExceeded);
        }

        let price = Self::read_i128(env, &DataKey::Price);
        if value != Self::cost_of(tokens, price)? {
            return Err(CrowdsaleError::InsufficientPayment);
        }

        let contract_addr = env.current_contract_address();
        if token::Client::new(env, &config.token).balance(&contract_addr) < tokens {
            return Err(CrowdsaleError::TransferFailed);
        }
        if token::Client::new(env, &config.payment_asset).balance(buyer) < value {
            return Err(CrowdsaleError::TransferFailed);
        }

        // Effects
        let raised = Self::read_i128(env, &DataKey::TotalRaised)
            .checked_add(value)
            .ok_or(CrowdsaleError::ArithmeticOverflow)?;
        let vault = Self::read_i128(env, &DataKey::VaultBalance)
            .checked_add(value)
            .ok_or(CrowdsaleError::ArithmeticOverflow)?;
        contribution.tokens = new_total;
        contribution.paid = contribution
            .paid
            .checked_add(value)
            .ok_or(CrowdsaleError::ArithmeticOverflow)?;

        let storage = env.storage().persistent();
        storage.set(&DataKey::TokensSold, &new_sold);
        storage.set(&DataKey::TotalRaised, &raised);
        storage.set(&DataKey::VaultBalance, &vault);
        storage.set(&contribution_key, &contribution);

        // Interactions
        Self::receive(env, &config.payment_asset, buyer, value)?;
        Self::send(env, &config.token, buyer, tokens)?;

        env.events()
            .publish((EVENT_PURCHASE, buyer.clone()), (tokens, value));
        Ok(())
    }

    // ── Owner administration ──────────────────────────────────

    /// Replace the price for future purchases. Owner only; not after finalize.
    pub fn set_price(env: Env, caller: Address, new_price: i128) -> Result<(), CrowdsaleError> {
        Self::require_owner(&env, &caller)?;
        Self::require_not_closed(&env)?;
        if new_price <= 0 {
            return Err(CrowdsaleError::InvalidAmount);
        }

        let previous = Self::price(env.clone());
        env.storage().persistent().set(&DataKey::Price, &new_price);
        env.events()
            .publish((EVENT_PRICE_SET, caller), (previous, new_price));
        Ok(())
    }

    fn whitelist_insert(env: &Env, caller: &Address, investor: &Address) {
        let key = DataKey::Whitelisted(investor.clone());
        if env.storage().persistent().has(&key) {
            return;
        }
        env.storage().persistent().set(&key, &true);
        let count = Self::whitelist_count(env.clone());
        env.storage()
            .persistent()
            .set(&DataKey::WhitelistCount, &(count + 1));
        env.events()
            .publish((EVENT_WL_ADD, caller.clone()), investor.clone());
    }

    /// Allow `investor` to buy. Owner only. Idempotent.
    pub fn add_to_whitelist(
        env: Env,
        caller: Address,
        investor: Address,
    ) -> Result<(), CrowdsaleError> {
        Self::require_owner(&env, &caller)?;
        Self::require_not_closed(&env)?;
        Self::whitelist_insert(&env, &caller, &investor);
        Ok(())
    }

    /// Whitelist up to `MAX_WHITELIST_BATCH` addresses in one call. Owner only.
    pub fn add_batch_to_whitelist(
        env: Env,
        caller: Address,
        investors: Vec<Address>,
    ) -> Result<(), CrowdsaleError> {
        Self::require_owner(&env, &caller)?;
        Self::require_not_closed(&env)?;
        if investors.len() > MAX_WHITELIST_BATCH {
            return Err(CrowdsaleError::InvalidAmount);
        }
        for investor in investors.iter() {
            Self::whitelist_insert(&env, &caller, &investor);
        }
        Ok(())
    }

    /// Revoke `investor`'s permission to buy. Owner only. Idempotent.
    /// Past contributions are unaffected.
    pub fn remove_from_whitelist(
        env: Env,
        caller: Address,
        investor: Address,
    ) -> Result<(), CrowdsaleError> {
        Self::require_owner(&env, &caller)?;
        Self::require_not_closed(&env)?;

        let key = DataKey::Whitelisted(investor.clone());
        if !env.storage().persistent().has(&key) {
            return Ok(());
        }
        env.storage().persistent().remove(&key);
        let count = Self::whitelist_count(env.clone());
        env.storage()
            .persistent()
            .set(&DataKey::WhitelistCount, &(count - 1));
        env.events().publish((EVENT_WL_REM, caller), investor);
        Ok(())
    }

    // ── Finalize ──────────────────────────────────────────────

    /// Close the sale. Owner only, at most once, and only after the window
    /// has elapsed or every token has been sold.
    ///
    /// Goal met: all remaining custody tokens and all held value go to the
    /// owner. Goal missed: value stays for refunds; unsold tokens go to the
    /// owner unless the config says `SweepOnSuccess`.
    pub fn finalize(env: Env, caller: Address) -> Result<SaleOutcome, CrowdsaleError> {
        let owner = Self::require_owner(&env, &caller)?;
        if Self::crowdsale_closed(env.clone()) {
            return Err(CrowdsaleError::AlreadyFinalized);
        }
        let config = Self::load_config(&env)?;

        let now = env.ledger().timestamp();
        let sold_out = Self::tokens_sold(env.clone()) >= config.max_tokens;
        if now <= config.end_time && !sold_out {
            return Err(CrowdsaleError::SaleStillOpen);
        }

        let goal_reached = Self::is_funding_goal_reached(env.clone());
        let vault = Self::vault_balance(env.clone());
        let tokens_swept = if goal_reached || config.unsold_policy == UnsoldTokenPolicy::SweepAlways
        {
            Self::tokens_remaining(env.clone())
        } else {
            0
        };
        let value_swept = if goal_reached { vault } else { 0 };

        let outcome = SaleOutcome {
            goal_reached,
            tokens_swept,
            value_swept,
            finalized_at: now,
        };

        let storage = env.storage().persistent();
        storage.set(&DataKey::Closed, &true);
        storage.set(&DataKey::Outcome, &outcome);
        storage.set(&DataKey::VaultBalance, &(vault - value_swept));

        if tokens_swept > 0 {
            Self::send(&env, &config.token, &owner, tokens_swept)?;
        }
        if value_swept > 0 {
            Self::send(&env, &config.payment_asset, &owner, value_swept)?;
        }

        log!(&env, "crowdsale finalized", goal_reached, tokens_swept, value_swept);
        env.events()
            .publish((EVENT_FINALIZE, owner), (tokens_swept, value_swept));
        Ok(outcome)
    }

    /// Move every sale token still in custody to the owner. Owner only, after
    /// finalize. Recovers inventory kept back by `SweepOnSuccess`.
    /// Returns the amount withdrawn.
    pub fn withdraw_unsold(env: Env, caller: Address) -> Result<i128, CrowdsaleError> {
        let owner = Self::require_owner(&env, &caller)?;
        let config = Self::load_config(&env)?;
        let mut outcome =
            Self::get_outcome(env.clone()).ok_or(CrowdsaleError::SaleNotFinalized)?;

        let amount = Self::tokens_remaining(env.clone());
        if amount <= 0 {
            return Err(CrowdsaleError::NothingToWithdraw);
        }
        outcome.tokens_swept = outcome
            .tokens_swept
            .checked_add(amount)
            .ok_or(CrowdsaleError::ArithmeticOverflow)?;
        env.storage().persistent().set(&DataKey::Outcome, &outcome);

        Self::send(&env, &config.token, &owner, amount)?;

        log!(&env, "unsold tokens withdrawn", amount);
        env.events().publish((EVENT_UNSOLD_WD, owner), amount);
        Ok(amount)
    }

    // ── Refunds ───────────────────────────────────────────────

    /// Return everything `caller` paid, once, after a finalize that missed the
    /// funding goal. Tokens already delivered are not reclaimed.
    pub fn claim_refund(env: Env, caller: Address) -> Result<i128, CrowdsaleError> {
        caller.require_auth();
        let config = Self::load_config(&env)?;

        let outcome = Self::get_outcome(env.clone()).ok_or(CrowdsaleError::SaleNotFinalized)?;
        if outcome.goal_reached {
            return Err(CrowdsaleError::GoalReachedNoRefund);
        }

        let key = DataKey::Contribution(caller.clone());
        let contribution: Contribution = env
            .storage()
            .persistent()
            .get(&key)
            .unwrap_or_default();
        if contribution.paid <= 0 {
            return Err(CrowdsaleError::NothingToRefund);
        }

        let vault = Self::vault_balance(env.clone())
            .checked_sub(contribution.paid)
            .ok_or(CrowdsaleError::ArithmeticOverflow)?;
        if vault < 0 {
            return Err(CrowdsaleError::TransferFailed);
        }

        env.storage().persistent().remove(&key);
        env.storage().persistent().set(&DataKey::VaultBalance, &vault);

        Self::send(&env, &config.payment_asset, &caller, contribution.paid)?;

        log!(&env, "refund claimed", contribution.paid);
        env.events()
            .publish((EVENT_REFUND, caller), contribution.paid);
        Ok(contribution.paid)
    }

    // ── Read-only accessors ───────────────────────────────────

    /// Current price in value units per token unit, scaled by `PRICE_SCALE`.
    pub fn price(env: Env) -> i128 {
        Self::read_i128(&env, &DataKey::Price)
    }

    /// Cost of `tokens` at the current price.
    pub fn quote(env: Env, tokens: i128) -> Result<i128, CrowdsaleError> {
        if tokens <= 0 {
            return Err(CrowdsaleError::InvalidAmount);
        }
        Self::load_config(&env)?;
        Self::cost_of(tokens, Self::price(env))
    }

    pub fn tokens_sold(env: Env) -> i128 {
        Self::read_i128(&env, &DataKey::TokensSold)
    }

    pub fn max_tokens(env: Env) -> Result<i128, CrowdsaleError> {
        Ok(Self::load_config(&env)?.max_tokens)
    }

    pub fn start_time(env: Env) -> Result<u64, CrowdsaleError> {
        Ok(Self::load_config(&env)?.start_time)
    }

    pub fn end_time(env: Env) -> Result<u64, CrowdsaleError> {
        Ok(Self::load_config(&env)?.end_time)
    }

    pub fn min_contribution(env: Env) -> Result<i128, CrowdsaleError> {
        Ok(Self::load_config(&env)?.min_contribution)
    }

    pub fn max_contribution(env: Env) -> Result<i128, CrowdsaleError> {
        Ok(Self::load_config(&env)?.max_contribution)
    }

    pub fn funding_goal(env: Env) -> Result<i128, CrowdsaleError> {
        Ok(Self::load_config(&env)?.funding_goal)
    }

    pub fn token(env: Env) -> Result<Address, CrowdsaleError> {
        Ok(Self::load_config(&env)?.token)
    }

    pub fn payment_asset(env: Env) -> Result<Address, CrowdsaleError> {
        Ok(Self::load_config(&env)?.payment_asset)
    }

    pub fn owner(env: Env) -> Option<Address> {
        env.storage().persistent().get(&DataKey::Owner)
    }

    pub fn get_config(env: Env) -> Option<SaleConfig> {
        env.storage().persistent().get(&DataKey::Config)
    }

    pub fn is_whitelisted(env: Env, investor: Address) -> bool {
        env.storage()
            .persistent()
            .get::<DataKey, bool>(&DataKey::Whitelisted(investor))
            .unwrap_or(false)
    }

    pub fn whitelist_count(env: Env) -> u32 {
        env.storage()
            .persistent()
            .get(&DataKey::WhitelistCount)
            .unwrap_or(0)
    }

    /// Tokens and value recorded for `investor` (zero once refunded).
    pub fn get_contribution(env: Env, investor: Address) -> Contribution {
        env.storage()
            .persistent()
            .get(&DataKey::Contribution(investor))
            .unwrap_or_default()
    }

    /// Cumulative value received. Refunds do not reduce it.
    pub fn total_raised(env: Env) -> i128 {
        Self::read_i128(&env, &DataKey::TotalRaised)
    }

    /// Value currently held on behalf of the sale.
    pub fn vault_balance(env: Env) -> i128 {
        Self::read_i128(&env, &DataKey::VaultBalance)
    }

    /// Live sale-token balance held in custody by this contract (0 before init).
    pub fn tokens_remaining(env: Env) -> i128 {
        match Self::load_config(&env) {
            Ok(config) => {
                token::Client::new(&env, &config.token).balance(&env.current_contract_address())
            }
            Err(_) => 0,
        }
    }

    pub fn is_funding_goal_reached(env: Env) -> bool {
        match Self::load_config(&env) {
            Ok(config) => Self::total_raised(env) >= config.funding_goal,
            Err(_) => false,
        }
    }

    pub fn crowdsale_closed(env: Env) -> bool {
        env.storage()
            .persistent()
            .get::<DataKey, bool>(&DataKey::Closed)
            .unwrap_or(false)
    }

    /// Settlement recorded by `finalize`, if it has run.
    pub fn get_outcome(env: Env) -> Option<SaleOutcome> {
        env.storage().persistent().get(&DataKey::Outcome)
    }

    pub fn status(env: Env) -> Result<SaleStatus, CrowdsaleError> {
        let config = Self::load_config(&env)?;
        if let Some(outcome) = Self::get_outcome(env.clone()) {
            return Ok(if outcome.goal_reached {
                SaleStatus::ClosedGoalMet
            } else {
                SaleStatus::ClosedGoalUnmet
            });
        }
        let now = env.ledger().timestamp();
        if now < config.start_time {
            Ok(SaleStatus::Pending)
        } else if now <= config.end_time && Self::tokens_sold(env) < config.max_tokens {
            Ok(SaleStatus::Open)
        } else {
            Ok(SaleStatus::Ended)
        }
    }

    /// Return the current contract version. Used for upgrade compatibility and migration.
    pub fn get_version(env: Env) -> u32 {
        let _ = env;
        CONTRACT_VERSION
    }
}

mod test_auth;
mod test_cross_contract;
