#![cfg(test)]
//! Interactions between the sale and the two asset contracts it relies on:
//! the sale token held in custody and the payment asset held in the vault.
use soroban_sdk::{
    testutils::{Address as _, Ledger as _},
    token, Address, Env,
};

use crate::{Crowdsale, CrowdsaleClient, CrowdsaleError, SaleConfig, UnsoldTokenPolicy, PRICE_SCALE};

const START: u64 = 10;
const END: u64 = 20;

fn create_asset(env: &Env) -> Address {
    let admin = Address::generate(env);
    env.register_stellar_asset_contract(admin)
}

fn mint(env: &Env, asset: &Address, to: &Address, amount: i128) {
    token::StellarAssetClient::new(env, asset).mint(to, &amount);
}

fn balance(env: &Env, asset: &Address, who: &Address) -> i128 {
    token::Client::new(env, asset).balance(who)
}

/// Sale with an unfunded custody: tests decide how many tokens the contract holds.
fn unfunded_sale() -> (
    Env,
    CrowdsaleClient<'static>,
    Address,
    Address,
    Address,
    Address,
) {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().with_mut(|li| li.timestamp = START);

    let contract_id = env.register_contract(None, Crowdsale);
    let client = CrowdsaleClient::new(&env, &contract_id);
    let owner = Address::generate(&env);
    let token = create_asset(&env);
    let payment = create_asset(&env);

    client.initialize(
        &owner,
        &SaleConfig {
            token: token.clone(),
            payment_asset: payment.clone(),
            price: PRICE_SCALE,
            max_tokens: 1_000,
            start_time: START,
            end_time: END,
            min_contribution: 1,
            max_contribution: 1_000,
            funding_goal: 100,
            unsold_policy: UnsoldTokenPolicy::SweepAlways,
        },
    );

    (env, client, owner, token, payment, contract_id)
}

fn funded_buyer(
    env: &Env,
    client: &CrowdsaleClient,
    owner: &Address,
    payment: &Address,
    funds: i128,
) -> Address {
    let buyer = Address::generate(env);
    client.add_to_whitelist(owner, &buyer);
    mint(env, payment, &buyer, funds);
    buyer
}

#[test]
fn buy_fails_when_custody_is_empty() {
    let (env, client, owner, token, payment, contract_id) = unfunded_sale();
    let buyer = funded_buyer(&env, &client, &owner, &payment, 100);

    assert_eq!(
        client.try_buy(&buyer, &10, &10),
        Err(Ok(CrowdsaleError::TransferFailed))
    );
    assert_eq!(client.tokens_sold(), 0);
    assert_eq!(client.vault_balance(), 0);
    assert_eq!(balance(&env, &payment, &buyer), 100);
    assert_eq!(balance(&env, &payment, &contract_id), 0);
    assert_eq!(balance(&env, &token, &buyer), 0);
}

#[test]
fn buy_fails_when_custody_is_short() {
    let (env, client, owner, token, payment, contract_id) = unfunded_sale();
    mint(&env, &token, &contract_id, 5);
    let buyer = funded_buyer(&env, &client, &owner, &payment, 100);

    assert_eq!(
        client.try_buy(&buyer, &10, &10),
        Err(Ok(CrowdsaleError::TransferFailed))
    );
    client.buy(&buyer, &5, &5);
    assert_eq!(client.tokens_remaining(), 0);
}

#[test]
fn buy_fails_when_buyer_cannot_pay() {
    let (env, client, owner, token, payment, contract_id) = unfunded_sale();
    mint(&env, &token, &contract_id, 1_000);
    let buyer = funded_buyer(&env, &client, &owner, &payment, 3);

    assert_eq!(
        client.try_buy(&buyer, &10, &10),
        Err(Ok(CrowdsaleError::TransferFailed))
    );
    assert_eq!(client.tokens_sold(), 0);
    assert_eq!(client.get_contribution(&buyer).tokens, 0);
    assert_eq!(balance(&env, &token, &contract_id), 1_000);
}

#[test]
fn finalize_sweeps_actual_custody_balance() {
    let (env, client, owner, token, payment, contract_id) = unfunded_sale();
    // Funded with less than max_tokens; the sweep moves what is really held.
    mint(&env, &token, &contract_id, 400);
    let buyer = funded_buyer(&env, &client, &owner, &payment, 1_000);
    client.buy(&buyer, &150, &150);

    env.ledger().with_mut(|li| li.timestamp = END + 1);
    let outcome = client.finalize(&owner);

    assert_eq!(outcome.tokens_swept, 250);
    assert_eq!(balance(&env, &token, &owner), 250);
    assert_eq!(balance(&env, &payment, &owner), 150);
}

#[test]
fn unattributed_value_is_not_swept_or_refunded() {
    let (env, client, owner, token, payment, contract_id) = unfunded_sale();
    mint(&env, &token, &contract_id, 1_000);
    let buyer = funded_buyer(&env, &client, &owner, &payment, 1_000);
    client.buy(&buyer, &40, &40);

    // Value sent straight to the contract address bypasses the sale ledger.
    mint(&env, &payment, &contract_id, 7);
    assert_eq!(client.vault_balance(), 40);

    env.ledger().with_mut(|li| li.timestamp = END + 1);
    client.finalize(&owner);
    assert_eq!(client.claim_refund(&buyer), 40);

    assert_eq!(client.vault_balance(), 0);
    assert_eq!(balance(&env, &payment, &contract_id), 7);
}

#[test]
fn ledger_totals_match_asset_balances() {
    let (env, client, owner, token, payment, contract_id) = unfunded_sale();
    mint(&env, &token, &contract_id, 1_000);
    let a = funded_buyer(&env, &client, &owner, &payment, 1_000);
    let b = funded_buyer(&env, &client, &owner, &payment, 1_000);
    let c = funded_buyer(&env, &client, &owner, &payment, 1_000);

    client.buy(&a, &12, &12);
    client.buy(&b, &7, &7);
    client.set_price(&owner, &(2 * PRICE_SCALE));
    client.buy(&c, &9, &18);
    client.buy(&a, &3, &6);

    let sold = client.tokens_sold();
    let paid: i128 = [&a, &b, &c]
        .iter()
        .map(|who| client.get_contribution(who).paid)
        .sum();
    let delivered: i128 = [&a, &b, &c]
        .iter()
        .map(|who| balance(&env, &token, who))
        .sum();

    assert_eq!(sold, 31);
    assert_eq!(delivered, sold);
    assert_eq!(paid, 43);
    assert_eq!(client.vault_balance(), paid);
    assert_eq!(balance(&env, &payment, &contract_id), paid);
    assert_eq!(client.tokens_remaining(), 1_000 - sold);
}

#[test]
fn refunds_drain_vault_exactly() {
    let (env, client, owner, token, payment, contract_id) = unfunded_sale();
    mint(&env, &token, &contract_id, 1_000);
    let a = funded_buyer(&env, &client, &owner, &payment, 1_000);
    let b = funded_buyer(&env, &client, &owner, &payment, 1_000);
    client.buy(&a, &20, &20);
    client.buy(&b, &30, &30);

    env.ledger().with_mut(|li| li.timestamp = END + 1);
    client.finalize(&owner);
    client.claim_refund(&a);
    client.claim_refund(&b);

    assert_eq!(client.vault_balance(), 0);
    assert_eq!(balance(&env, &payment, &contract_id), 0);
    assert_eq!(balance(&env, &payment, &a), 1_000);
    assert_eq!(balance(&env, &payment, &b), 1_000);
    assert_eq!(balance(&env, &payment, &owner), 0);
}
