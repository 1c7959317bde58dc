#![cfg(test)]
use soroban_sdk::{
    testutils::{Address as _, Ledger as _},
    token, vec, Address, Env,
};

use crate::{
    Crowdsale, CrowdsaleClient, CrowdsaleError, SaleConfig, UnsoldTokenPolicy, PRICE_SCALE,
};

const START: u64 = 100;
const END: u64 = 200;

fn make_client(env: &Env) -> CrowdsaleClient<'_> {
    let id = env.register_contract(None, Crowdsale);
    CrowdsaleClient::new(env, &id)
}

fn create_asset(env: &Env) -> Address {
    let admin = Address::generate(env);
    env.register_stellar_asset_contract(admin)
}

fn init_sale(env: &Env, client: &CrowdsaleClient) -> (Address, Address, Address) {
    env.mock_all_auths();
    env.ledger().with_mut(|li| li.timestamp = START);
    let owner = Address::generate(env);
    let token = create_asset(env);
    let payment = create_asset(env);
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
            funding_goal: 50,
            unsold_policy: UnsoldTokenPolicy::SweepAlways,
        },
    );
    token::StellarAssetClient::new(env, &token).mint(&client.address, &1_000);
    (owner, token, payment)
}

#[test]
fn set_price_unauthorized() {
    let env = Env::default();
    let client = make_client(&env);
    let (owner, _token, _payment) = init_sale(&env, &client);
    let attacker = Address::generate(&env);

    assert_eq!(
        client.try_set_price(&attacker, &(2 * PRICE_SCALE)),
        Err(Ok(CrowdsaleError::Unauthorized))
    );
    assert_eq!(client.price(), PRICE_SCALE);
    client.set_price(&owner, &(2 * PRICE_SCALE));
    assert_eq!(client.price(), 2 * PRICE_SCALE);
}

#[test]
fn finalize_unauthorized() {
    let env = Env::default();
    let client = make_client(&env);
    let (owner, token, _payment) = init_sale(&env, &client);
    let attacker = Address::generate(&env);

    env.ledger().with_mut(|li| li.timestamp = END + 1);
    assert_eq!(
        client.try_finalize(&attacker),
        Err(Ok(CrowdsaleError::Unauthorized))
    );
    assert!(!client.crowdsale_closed());
    assert_eq!(token::Client::new(&env, &token).balance(&attacker), 0);
    assert_eq!(client.tokens_remaining(), 1_000);

    client.finalize(&owner);
    assert!(client.crowdsale_closed());
}

#[test]
fn withdraw_unsold_unauthorized() {
    let env = Env::default();
    let client = make_client(&env);
    let (owner, token, _payment) = init_sale(&env, &client);
    let attacker = Address::generate(&env);

    env.ledger().with_mut(|li| li.timestamp = END + 1);
    client.finalize(&owner);
    token::StellarAssetClient::new(&env, &token).mint(&client.address, &25);

    assert_eq!(
        client.try_withdraw_unsold(&attacker),
        Err(Ok(CrowdsaleError::Unauthorized))
    );
    assert_eq!(client.tokens_remaining(), 25);
    assert_eq!(client.withdraw_unsold(&owner), 25);
}

#[test]
fn whitelist_add_unauthorized() {
    let env = Env::default();
    let client = make_client(&env);
    let (_owner, _token, _payment) = init_sale(&env, &client);
    let attacker = Address::generate(&env);

    assert_eq!(
        client.try_add_to_whitelist(&attacker, &attacker),
        Err(Ok(CrowdsaleError::Unauthorized))
    );
    assert!(!client.is_whitelisted(&attacker));
    assert_eq!(client.whitelist_count(), 0);
}

#[test]
fn whitelist_batch_unauthorized() {
    let env = Env::default();
    let client = make_client(&env);
    let (_owner, _token, _payment) = init_sale(&env, &client);
    let attacker = Address::generate(&env);
    let friend = Address::generate(&env);

    assert_eq!(
        client.try_add_batch_to_whitelist(&attacker, &vec![&env, attacker.clone(), friend.clone()]),
        Err(Ok(CrowdsaleError::Unauthorized))
    );
    assert!(!client.is_whitelisted(&friend));
}

#[test]
fn whitelist_remove_unauthorized() {
    let env = Env::default();
    let client = make_client(&env);
    let (owner, _token, _payment) = init_sale(&env, &client);
    let investor = Address::generate(&env);
    let attacker = Address::generate(&env);

    client.add_to_whitelist(&owner, &investor);
    assert_eq!(
        client.try_remove_from_whitelist(&attacker, &investor),
        Err(Ok(CrowdsaleError::Unauthorized))
    );
    assert!(client.is_whitelisted(&investor));
}

#[test]
fn unauthorized_is_reported_before_already_finalized() {
    let env = Env::default();
    let client = make_client(&env);
    let (owner, _token, _payment) = init_sale(&env, &client);
    let attacker = Address::generate(&env);

    env.ledger().with_mut(|li| li.timestamp = END + 1);
    client.finalize(&owner);
    assert_eq!(
        client.try_finalize(&attacker),
        Err(Ok(CrowdsaleError::Unauthorized))
    );
}

#[test]
fn initialize_missing_auth_no_mutation() {
    let env = Env::default();
    let client = make_client(&env);
    let owner = Address::generate(&env);
    let token = Address::generate(&env);
    let payment = Address::generate(&env);

    let result = client.try_initialize(
        &owner,
        &SaleConfig {
            token,
            payment_asset: payment,
            price: PRICE_SCALE,
            max_tokens: 1_000,
            start_time: START,
            end_time: END,
            min_contribution: 1,
            max_contribution: 1_000,
            funding_goal: 50,
            unsold_policy: UnsoldTokenPolicy::SweepAlways,
        },
    );
    assert!(result.is_err());
    assert!(client.owner().is_none());
}

#[test]
fn set_price_missing_auth_no_mutation() {
    let env = Env::default();
    let client = make_client(&env);
    let (owner, _token, _payment) = init_sale(&env, &client);
    env.set_auths(&[]);

    assert!(client.try_set_price(&owner, &(5 * PRICE_SCALE)).is_err());
    assert_eq!(client.price(), PRICE_SCALE);
}

#[test]
fn finalize_missing_auth_no_mutation() {
    let env = Env::default();
    let client = make_client(&env);
    let (owner, _token, _payment) = init_sale(&env, &client);
    env.ledger().with_mut(|li| li.timestamp = END + 1);
    env.set_auths(&[]);

    assert!(client.try_finalize(&owner).is_err());
    assert!(!client.crowdsale_closed());
    assert_eq!(client.tokens_remaining(), 1_000);
}

#[test]
fn buy_missing_auth_no_mutation() {
    let env = Env::default();
    let client = make_client(&env);
    let (owner, _token, payment) = init_sale(&env, &client);
    let buyer = Address::generate(&env);
    client.add_to_whitelist(&owner, &buyer);
    token::StellarAssetClient::new(&env, &payment).mint(&buyer, &100);
    env.set_auths(&[]);

    assert!(client.try_buy(&buyer, &10, &10).is_err());
    assert_eq!(client.tokens_sold(), 0);
    assert_eq!(token::Client::new(&env, &payment).balance(&buyer), 100);
}

#[test]
fn claim_refund_missing_auth_no_mutation() {
    let env = Env::default();
    let client = make_client(&env);
    let (owner, _token, payment) = init_sale(&env, &client);
    let buyer = Address::generate(&env);
    client.add_to_whitelist(&owner, &buyer);
    token::StellarAssetClient::new(&env, &payment).mint(&buyer, &100);
    client.buy(&buyer, &10, &10);
    env.ledger().with_mut(|li| li.timestamp = END + 1);
    client.finalize(&owner);
    env.set_auths(&[]);

    assert!(client.try_claim_refund(&buyer).is_err());
    assert_eq!(client.vault_balance(), 10);
    assert_eq!(client.get_contribution(&buyer).paid, 10);
}

#[test]
#[should_panic]
fn buy_requires_auth() {
    let env = Env::default(); // no mock_all_auths
    let client = make_client(&env);
    let buyer = Address::generate(&env);

    client.buy(&buyer, &10, &10);
}
