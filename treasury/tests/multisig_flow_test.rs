//! Integration tests for the quorum-gated treasury surface.
//!
//! These tests drive the full submit / confirm / execute pipeline through
//! the bank treasury, verifying that executed actions actually land in the
//! ledger and registry and that execute-once holds.

use std::sync::Arc;

use tessera_protocol::config::{INITIAL_SUPPLY, MAX_TREASURY_FEE_BPS};
use tessera_protocol::{ProfileDirectory, ProtocolState, RegistryError};
use tessera_treasury::{BankError, BankTreasury, MultisigError, TreasuryAction};

const TREASURY_ADDR: &str = "tsr:bank";
const GOV: &str = "tsr:governance";
const ALICE: &str = "tsr:alice";
const A: &str = "tsr:signer-a";
const B: &str = "tsr:signer-b";
const C: &str = "tsr:signer-c";

fn setup() -> (BankTreasury, u64) {
    let mut dir = ProfileDirectory::new(TREASURY_ADDR);
    let alice = dir.register(ALICE);

    let bank = BankTreasury::new(
        TREASURY_ADDR,
        GOV,
        vec![A.into(), B.into(), C.into()],
        3,
        Arc::new(dir),
    )
    .unwrap();
    bank.set_protocol_state(GOV, ProtocolState::Unpaused)
        .unwrap();
    (bank, alice)
}

fn confirm_all(bank: &BankTreasury, id: u64) {
    for signer in [A, B, C] {
        bank.confirm_transaction(signer, id).unwrap();
    }
}

// ---------------------------------------------------------------------------
// Withdrawal via Quorum
// ---------------------------------------------------------------------------

#[test]
fn quorum_withdrawal_full_pipeline() {
    let (bank, alice) = setup();
    let id = bank
        .submit_transaction(A, TreasuryAction::Withdraw {
            to: alice,
            amount: 2_000,
        })
        .unwrap();
    assert_eq!(bank.transaction_count(), 1);

    // Nothing moves before quorum.
    bank.confirm_transaction(A, id).unwrap();
    bank.confirm_transaction(B, id).unwrap();
    let result = bank.execute_transaction(A, id);
    assert!(matches!(
        result,
        Err(BankError::Multisig(
            MultisigError::InsufficientConfirmations { have: 2, need: 3 }
        ))
    ));
    assert_eq!(bank.balance_of(alice), 0);

    bank.confirm_transaction(C, id).unwrap();
    bank.execute_transaction(A, id).unwrap();
    assert_eq!(bank.balance_of(alice), 2_000);
    assert_eq!(bank.reserve_balance(), INITIAL_SUPPLY - 2_000);
    assert!(bank.transaction(id).unwrap().executed);
}

#[test]
fn executed_transaction_cannot_run_twice() {
    let (bank, alice) = setup();
    let id = bank
        .submit_transaction(A, TreasuryAction::Withdraw {
            to: alice,
            amount: 500,
        })
        .unwrap();
    confirm_all(&bank, id);
    bank.execute_transaction(B, id).unwrap();

    let result = bank.execute_transaction(C, id);
    assert!(matches!(
        result,
        Err(BankError::Multisig(MultisigError::AlreadyExecuted(_)))
    ));
    // Exactly one payout happened.
    assert_eq!(bank.balance_of(alice), 500);
}

#[test]
fn revoked_confirmation_blocks_execution() {
    let (bank, alice) = setup();
    let id = bank
        .submit_transaction(A, TreasuryAction::Withdraw {
            to: alice,
            amount: 500,
        })
        .unwrap();
    confirm_all(&bank, id);
    bank.revoke_confirmation(C, id).unwrap();

    assert!(matches!(
        bank.execute_transaction(A, id),
        Err(BankError::Multisig(
            MultisigError::InsufficientConfirmations { .. }
        ))
    ));

    // Re-confirmation restores executability.
    bank.confirm_transaction(C, id).unwrap();
    bank.execute_transaction(A, id).unwrap();
    assert_eq!(bank.balance_of(alice), 500);
}

#[test]
fn outsider_locked_out_of_the_queue() {
    let (bank, alice) = setup();
    assert!(matches!(
        bank.submit_transaction(ALICE, TreasuryAction::Withdraw {
            to: alice,
            amount: 1
        }),
        Err(BankError::Multisig(MultisigError::NotSigner { .. }))
    ));

    let id = bank
        .submit_transaction(A, TreasuryAction::Withdraw {
            to: alice,
            amount: 1,
        })
        .unwrap();
    confirm_all(&bank, id);
    assert!(matches!(
        bank.execute_transaction(ALICE, id),
        Err(BankError::Multisig(MultisigError::NotSigner { .. }))
    ));
}

#[test]
fn failed_action_leaves_transaction_executable() {
    let (bank, alice) = setup();
    let id = bank
        .submit_transaction(A, TreasuryAction::Withdraw {
            to: alice,
            amount: INITIAL_SUPPLY + 1,
        })
        .unwrap();
    confirm_all(&bank, id);

    assert!(bank.execute_transaction(A, id).is_err());
    // The executed flag never flipped; a retry is still possible.
    assert!(!bank.transaction(id).unwrap().executed);
}

// ---------------------------------------------------------------------------
// Parameter Actions
// ---------------------------------------------------------------------------

#[test]
fn quorum_fee_change_lands_in_registry() {
    let (bank, _) = setup();
    let id = bank
        .submit_transaction(A, TreasuryAction::SetTreasuryFee { bps: 200 })
        .unwrap();
    confirm_all(&bank, id);
    bank.execute_transaction(A, id).unwrap();
    assert_eq!(bank.treasury_fee_bps(), 200);
}

#[test]
fn quorum_fee_change_still_ceiling_checked() {
    let (bank, _) = setup();
    let before = bank.treasury_fee_bps();
    let id = bank
        .submit_transaction(A, TreasuryAction::SetTreasuryFee {
            bps: MAX_TREASURY_FEE_BPS + 1,
        })
        .unwrap();
    confirm_all(&bank, id);

    let result = bank.execute_transaction(A, id);
    assert!(matches!(
        result,
        Err(BankError::Registry(RegistryError::InitParamsInvalid(_)))
    ));
    assert_eq!(bank.treasury_fee_bps(), before);
    assert!(!bank.transaction(id).unwrap().executed);
}

#[test]
fn quorum_governance_handover() {
    let (bank, alice) = setup();
    let id = bank
        .submit_transaction(A, TreasuryAction::SetGovernance {
            address: "tsr:new-gov".into(),
        })
        .unwrap();
    confirm_all(&bank, id);
    bank.execute_transaction(A, id).unwrap();

    assert_eq!(bank.governance(), "tsr:new-gov");
    // The old governance key is powerless now.
    assert!(matches!(
        bank.withdraw(GOV, alice, 1),
        Err(BankError::Registry(RegistryError::Unauthorized { .. }))
    ));
    bank.withdraw("tsr:new-gov", alice, 1).unwrap();
}

#[test]
fn quorum_emergency_pause() {
    let (bank, alice) = setup();
    let id = bank
        .submit_transaction(A, TreasuryAction::SetProtocolState {
            state: ProtocolState::Paused,
        })
        .unwrap();
    confirm_all(&bank, id);
    bank.execute_transaction(A, id).unwrap();

    assert_eq!(bank.protocol_state(), ProtocolState::Paused);
    assert!(matches!(
        bank.withdraw(GOV, alice, 1),
        Err(BankError::Registry(RegistryError::ProtocolPaused))
    ));
}
