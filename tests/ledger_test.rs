mod common;

use lumina::domain::{NewTokenTransaction, TransactionKind};
use lumina::repository::LedgerRepository;
use uuid::Uuid;

#[tokio::test]
async fn balance_is_sum_of_appends() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;
    let user = common::create_user(&ctx, "ledger@example.com", None).await?;

    assert_eq!(ctx.ledger_repo.balance_of(user.id).await?, 0);

    ctx.ledger_repo
        .append(NewTokenTransaction {
            user_id: user.id,
            kind: TransactionKind::AdminGrant,
            amount: 100,
            description: "Grant".to_string(),
            related_payment_id: None,
        })
        .await?;
    ctx.ledger_repo
        .append(NewTokenTransaction {
            user_id: user.id,
            kind: TransactionKind::SpendOnImage,
            amount: -10,
            description: "Generated an image".to_string(),
            related_payment_id: None,
        })
        .await?;
    ctx.ledger_repo
        .append(NewTokenTransaction {
            user_id: user.id,
            kind: TransactionKind::SpendOnVideo,
            amount: -20,
            description: "Generated a video".to_string(),
            related_payment_id: None,
        })
        .await?;

    assert_eq!(ctx.ledger_repo.balance_of(user.id).await?, 70);

    // History is newest first and complete
    let transactions = ctx.ledger_repo.transactions_of(user.id).await?;
    assert_eq!(transactions.len(), 3);
    assert_eq!(transactions[0].kind, TransactionKind::SpendOnVideo);
    assert_eq!(transactions[2].kind, TransactionKind::AdminGrant);

    // Balances are per user
    let other = common::create_user(&ctx, "other@example.com", None).await?;
    assert_eq!(ctx.ledger_repo.balance_of(other.id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn finds_transaction_by_related_payment_and_kind() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;
    let user = common::create_user(&ctx, "related@example.com", None).await?;

    let payment_id = Uuid::new_v4();
    ctx.ledger_repo
        .append(NewTokenTransaction {
            user_id: user.id,
            kind: TransactionKind::ReferralUpgradeEarn,
            amount: 10,
            description: "Referral upgrade bonus".to_string(),
            related_payment_id: Some(payment_id),
        })
        .await?;

    let found = ctx
        .ledger_repo
        .find_by_related_payment(payment_id, TransactionKind::ReferralUpgradeEarn)
        .await?;
    assert!(found.is_some());
    assert_eq!(found.unwrap().amount, 10);

    // Same payment, different kind
    let missing = ctx
        .ledger_repo
        .find_by_related_payment(payment_id, TransactionKind::ReferralUpgradeReversal)
        .await?;
    assert!(missing.is_none());

    // Different payment entirely
    let missing = ctx
        .ledger_repo
        .find_by_related_payment(Uuid::new_v4(), TransactionKind::ReferralUpgradeEarn)
        .await?;
    assert!(missing.is_none());

    Ok(())
}

#[tokio::test]
async fn signup_referral_bonus_lands_on_referrer() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;

    let referrer = common::create_user(&ctx, "referrer@example.com", None).await?;
    common::create_user(&ctx, "invitee@example.com", Some(referrer.id)).await?;

    assert_eq!(ctx.ledger_repo.balance_of(referrer.id).await?, 1);
    let transactions = ctx.ledger_repo.transactions_of(referrer.id).await?;
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].kind, TransactionKind::ReferralSignupEarn);

    Ok(())
}
