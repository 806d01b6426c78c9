mod common;

use chrono::{Duration, Utc};
use lumina::{
    domain::{Credits, PaymentStatus, Plan, RailKind, TransactionKind},
    error::AppError,
    rails::CardDetails,
    repository::{CreditsRepository, LedgerRepository, PaymentRepository, UserRepository},
};

fn test_card() -> CardDetails {
    CardDetails {
        cardholder_name: "Test User".to_string(),
        card_number: "4242 4242 4242 4242".to_string(),
        expiry_date: "12/39".to_string(),
        cvc: "123".to_string(),
    }
}

#[tokio::test]
async fn card_approval_upgrades_and_debits_discount() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;
    let user = common::create_user(&ctx, "upgrade@example.com", None).await?;
    let method = common::method_for(&ctx, RailKind::Card).await?;

    ctx.admin_service.grant_tokens(user.id, 50, None).await?;

    let payment = ctx
        .payment_service
        .submit_card(user.id, method.id, test_card(), 50)
        .await?;

    assert_eq!(payment.status, PaymentStatus::Approved);
    assert_eq!(payment.plan_price_cents, 999);
    assert_eq!(payment.token_discount_cents, 50);
    assert_eq!(payment.amount_paid_cents, 949);
    assert_eq!(payment.tokens_debited, 50);
    assert!(payment.proof.reference.as_deref().unwrap_or("").starts_with("ch_"));

    let user = ctx.account_service.get_user(user.id).await?;
    assert_eq!(user.plan, Plan::Pro);
    let expires = user.plan_expiration_date.expect("pro plan has an expiration");
    let expected = Utc::now() + Duration::days(30);
    assert!((expires - expected).num_minutes().abs() < 5);

    assert_eq!(ctx.credits_repo.get(user.id).await?, Credits::PRO_TIER);

    // The applied tokens were debited through the ledger, tied to the payment
    assert_eq!(ctx.ledger_repo.balance_of(user.id).await?, 0);
    let debit = ctx
        .ledger_repo
        .find_by_related_payment(payment.id, TransactionKind::SpendOnUpgradeDiscount)
        .await?
        .expect("discount debit recorded");
    assert_eq!(debit.amount, -50);

    Ok(())
}

#[tokio::test]
async fn invalid_card_fails_before_any_record_exists() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;
    let user = common::create_user(&ctx, "badcard@example.com", None).await?;
    let method = common::method_for(&ctx, RailKind::Card).await?;

    let expired = CardDetails {
        expiry_date: "01/20".to_string(),
        ..test_card()
    };
    let err = ctx
        .payment_service
        .submit_card(user.id, method.id, expired, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Structural failures leave no payment behind
    assert!(ctx.payment_repo.find_by_user(user.id).await?.is_empty());
    let user = ctx.account_service.get_user(user.id).await?;
    assert_eq!(user.plan, Plan::Free);

    Ok(())
}

#[tokio::test]
async fn declined_card_records_rejection() -> anyhow::Result<()> {
    let mut settings = common::test_settings();
    settings.rails.card.decline_rate = 1.0;
    let ctx = common::test_context(&settings).await?;
    let user = common::create_user(&ctx, "declined@example.com", None).await?;
    let method = common::method_for(&ctx, RailKind::Card).await?;

    let declinable = CardDetails {
        card_number: "4111 1111 1111 1111".to_string(),
        ..test_card()
    };
    let payment = ctx
        .payment_service
        .submit_card(user.id, method.id, declinable, 0)
        .await?;

    assert_eq!(payment.status, PaymentStatus::Rejected);
    assert!(payment.verification_error.is_some());

    let user = ctx.account_service.get_user(user.id).await?;
    assert_eq!(user.plan, Plan::Free);

    Ok(())
}

#[tokio::test]
async fn test_card_suffix_bypasses_decline_roll() -> anyhow::Result<()> {
    let mut settings = common::test_settings();
    settings.rails.card.decline_rate = 1.0;
    let ctx = common::test_context(&settings).await?;
    let user = common::create_user(&ctx, "suffix@example.com", None).await?;
    let method = common::method_for(&ctx, RailKind::Card).await?;

    let payment = ctx
        .payment_service
        .submit_card(user.id, method.id, test_card(), 0)
        .await?;
    assert_eq!(payment.status, PaymentStatus::Approved);

    Ok(())
}

#[tokio::test]
async fn crypto_rejects_malformed_hash() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;
    let user = common::create_user(&ctx, "crypto@example.com", None).await?;
    let method = common::method_for(&ctx, RailKind::Crypto).await?;

    let payment = ctx
        .payment_service
        .submit_crypto(user.id, method.id, "0xdeadbeef".to_string(), 0)
        .await?;

    assert_eq!(payment.status, PaymentStatus::Rejected);
    assert!(payment
        .verification_error
        .as_deref()
        .unwrap_or("")
        .contains("Invalid transaction format"));

    let user = ctx.account_service.get_user(user.id).await?;
    assert_eq!(user.plan, Plan::Free);

    Ok(())
}

#[tokio::test]
async fn crypto_approves_and_blocks_duplicate_hash() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;
    let method = common::method_for(&ctx, RailKind::Crypto).await?;
    let hash = "0xreal-1234567890abcdef1234".to_string();

    let first = common::create_user(&ctx, "first@example.com", None).await?;
    let payment = ctx
        .payment_service
        .submit_crypto(first.id, method.id, hash.clone(), 0)
        .await?;
    assert_eq!(payment.status, PaymentStatus::Approved);
    assert_eq!(payment.proof.reference.as_deref(), Some(hash.as_str()));

    // The same hash cannot buy a second upgrade, even case-shifted
    let second = common::create_user(&ctx, "second@example.com", None).await?;
    let duplicate = ctx
        .payment_service
        .submit_crypto(second.id, method.id, hash.to_uppercase(), 0)
        .await?;
    assert_eq!(duplicate.status, PaymentStatus::Rejected);
    assert!(duplicate
        .verification_error
        .as_deref()
        .unwrap_or("")
        .contains("Duplicate transaction hash"));

    let second = ctx.account_service.get_user(second.id).await?;
    assert_eq!(second.plan, Plan::Free);

    Ok(())
}

#[tokio::test]
async fn reversal_restores_ledger_and_plan_exactly_once() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;
    let method = common::method_for(&ctx, RailKind::Card).await?;

    let referrer = common::create_user(&ctx, "ref@example.com", None).await?;
    let user = common::create_user(&ctx, "payer@example.com", Some(referrer.id)).await?;
    ctx.admin_service.grant_tokens(user.id, 50, None).await?;

    let payment = ctx
        .payment_service
        .submit_card(user.id, method.id, test_card(), 50)
        .await?;
    assert_eq!(payment.status, PaymentStatus::Approved);

    // Signup bonus plus upgrade bonus
    assert_eq!(ctx.ledger_repo.balance_of(referrer.id).await?, 11);
    assert_eq!(ctx.ledger_repo.balance_of(user.id).await?, 0);

    // Rejecting the approved payment reverts everything
    let reverted = ctx.admin_service.reject(payment.id, None).await?;
    assert_eq!(reverted.status, PaymentStatus::Rejected);
    assert_eq!(
        reverted.verification_error.as_deref(),
        Some("Payment reverted by administrator.")
    );

    let user_after = ctx.account_service.get_user(user.id).await?;
    assert_eq!(user_after.plan, Plan::Free);
    assert!(user_after.plan_expiration_date.is_none());
    assert_eq!(ctx.ledger_repo.balance_of(user.id).await?, 50);
    assert_eq!(ctx.ledger_repo.balance_of(referrer.id).await?, 1);
    assert_eq!(
        ctx.credits_repo.get(user.id).await?,
        Credits::FREE_TIER
    );

    // Re-running the reversal adds no further compensating entries
    let payment_after = ctx.payment_repo.find_by_id(payment.id).await?.unwrap();
    ctx.settlement_service
        .reverse_approval(&payment_after, &user_after, "again")
        .await?;
    assert_eq!(ctx.ledger_repo.balance_of(user.id).await?, 50);
    assert_eq!(ctx.ledger_repo.balance_of(referrer.id).await?, 1);

    // And the admin path refuses a second rejection outright
    let err = ctx.admin_service.reject(payment.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    Ok(())
}

#[tokio::test]
async fn requeue_and_reapprove_do_not_duplicate_bonuses() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;
    let method = common::method_for(&ctx, RailKind::Card).await?;

    let referrer = common::create_user(&ctx, "ref2@example.com", None).await?;
    let user = common::create_user(&ctx, "payer2@example.com", Some(referrer.id)).await?;

    let payment = ctx
        .payment_service
        .submit_card(user.id, method.id, test_card(), 0)
        .await?;
    assert_eq!(ctx.ledger_repo.balance_of(referrer.id).await?, 11);

    let requeued = ctx.admin_service.requeue(payment.id).await?;
    assert_eq!(requeued.status, PaymentStatus::Pending);
    assert_eq!(
        requeued.verification_error.as_deref(),
        Some("Marked as pending for re-validation by admin.")
    );
    // Requeue alone touches neither plan nor ledger
    let user_mid = ctx.account_service.get_user(user.id).await?;
    assert_eq!(user_mid.plan, Plan::Pro);

    let reapproved = ctx.admin_service.approve(payment.id).await?;
    assert_eq!(reapproved.status, PaymentStatus::Approved);
    assert!(reapproved
        .proof
        .reference
        .as_deref()
        .unwrap_or("")
        .starts_with("MANUAL_"));

    // The upgrade bonus was issued once across both approvals
    assert_eq!(ctx.ledger_repo.balance_of(referrer.id).await?, 11);

    Ok(())
}

#[tokio::test]
async fn admin_approve_and_delete_guard_status() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;
    let method = common::method_for(&ctx, RailKind::Bank).await?;
    let user = common::create_user(&ctx, "admin@example.com", None).await?;

    let payment = ctx
        .payment_service
        .submit_bank(user.id, method.id, "receipt.pdf".to_string(), 0)
        .await?;
    assert_eq!(payment.status, PaymentStatus::Pending);

    let approved = ctx.admin_service.approve(payment.id).await?;
    assert_eq!(approved.status, PaymentStatus::Approved);

    // Approving twice is a conflict
    let err = ctx.admin_service.approve(payment.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Settled records cannot be deleted
    let err = ctx.admin_service.delete(payment.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // A pending record can
    let pending = ctx
        .payment_service
        .submit_bank(user.id, method.id, "receipt2.pdf".to_string(), 0)
        .await?;
    ctx.admin_service.delete(pending.id).await?;
    assert!(ctx.payment_repo.find_by_id(pending.id).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn lapsed_pro_plan_downgrades_on_read() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;
    let user = common::create_user(&ctx, "lapsed@example.com", None).await?;

    let started = Utc::now() - Duration::days(40);
    let expired = Utc::now() - Duration::days(10);
    ctx.user_repo
        .set_plan(user.id, Plan::Pro, Some(started), Some(expired))
        .await?;
    ctx.credits_repo.set(user.id, Credits::PRO_TIER).await?;

    let user = ctx.account_service.get_user(user.id).await?;
    assert_eq!(user.plan, Plan::Free);
    assert!(user.plan_expiration_date.is_none());
    assert_eq!(ctx.credits_repo.get(user.id).await?, Credits::FREE_TIER);

    Ok(())
}
