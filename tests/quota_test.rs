mod common;

use lumina::domain::{Credits, Plan, ResourceKind, TransactionKind};
use lumina::repository::{CreditsRepository, LedgerRepository, UserRepository};

#[tokio::test]
async fn credits_are_consumed_before_tokens() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;
    let user = common::create_user(&ctx, "quota@example.com", None).await?;

    // The free tier starts with five image credits
    for _ in 0..5 {
        let consumed = ctx
            .quota_service
            .consume_on_generate(user.id, ResourceKind::Image, false)
            .await?;
        assert!(consumed);
    }
    assert_eq!(ctx.credits_repo.get(user.id).await?.image, 0);
    // Credit consumption never touches the ledger
    assert!(ctx.ledger_repo.transactions_of(user.id).await?.is_empty());

    // Credits exhausted and no tokens: blocked
    assert!(!ctx.quota_service.can_generate(user.id, ResourceKind::Image, false).await?);
    let consumed = ctx
        .quota_service
        .consume_on_generate(user.id, ResourceKind::Image, false)
        .await?;
    assert!(!consumed);

    // With tokens on the ledger, generation spends them instead
    ctx.admin_service.grant_tokens(user.id, 10, None).await?;
    assert!(ctx.quota_service.can_generate(user.id, ResourceKind::Image, false).await?);
    let consumed = ctx
        .quota_service
        .consume_on_generate(user.id, ResourceKind::Image, false)
        .await?;
    assert!(consumed);
    assert_eq!(ctx.ledger_repo.balance_of(user.id).await?, 0);

    let transactions = ctx.ledger_repo.transactions_of(user.id).await?;
    assert_eq!(transactions[0].kind, TransactionKind::SpendOnImage);
    assert_eq!(transactions[0].amount, -10);

    Ok(())
}

#[tokio::test]
async fn video_generation_costs_more_tokens() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;
    let user = common::create_user(&ctx, "video@example.com", None).await?;

    // Burn both video credits
    for _ in 0..2 {
        assert!(ctx
            .quota_service
            .consume_on_generate(user.id, ResourceKind::Video, false)
            .await?);
    }

    // Ten tokens cover an image but not a video
    ctx.admin_service.grant_tokens(user.id, 10, None).await?;
    assert!(!ctx.quota_service.can_generate(user.id, ResourceKind::Video, false).await?);

    ctx.admin_service.grant_tokens(user.id, 10, None).await?;
    assert!(ctx.quota_service.can_generate(user.id, ResourceKind::Video, false).await?);
    assert!(ctx
        .quota_service
        .consume_on_generate(user.id, ResourceKind::Video, false)
        .await?);
    assert_eq!(ctx.ledger_repo.balance_of(user.id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn watermark_free_exports_gate_on_their_own_counter() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;
    let user = common::create_user(&ctx, "watermark@example.com", None).await?;

    // Two watermark-free exports in the free tier
    for _ in 0..2 {
        assert!(ctx
            .quota_service
            .consume_on_generate(user.id, ResourceKind::Image, true)
            .await?);
    }
    let credits = ctx.credits_repo.get(user.id).await?;
    assert_eq!(credits.no_watermark, 0);
    assert_eq!(credits.image, 3);

    // Image credits remain, but watermark-free is exhausted
    assert!(!ctx.quota_service.can_generate(user.id, ResourceKind::Image, true).await?);
    assert!(ctx.quota_service.can_generate(user.id, ResourceKind::Image, false).await?);

    Ok(())
}

#[tokio::test]
async fn pro_users_are_never_metered() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;
    let user = common::create_user(&ctx, "pro@example.com", None).await?;

    let now = chrono::Utc::now();
    ctx.user_repo
        .set_plan(user.id, Plan::Pro, Some(now), Some(now + chrono::Duration::days(30)))
        .await?;
    ctx.credits_repo.set(user.id, Credits::PRO_TIER).await?;

    for _ in 0..10 {
        assert!(ctx
            .quota_service
            .consume_on_generate(user.id, ResourceKind::Video, true)
            .await?);
    }

    // Neither credits nor the ledger moved
    assert_eq!(ctx.credits_repo.get(user.id).await?, Credits::PRO_TIER);
    assert!(ctx.ledger_repo.transactions_of(user.id).await?.is_empty());

    Ok(())
}
