mod common;

use std::time::Duration;

use lumina::domain::{PaymentStatus, Plan, RailKind};
use lumina::repository::PaymentRepository;

#[tokio::test]
async fn bank_payment_settles_through_verify_one() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;
    let method = common::method_for(&ctx, RailKind::Bank).await?;
    let user = common::create_user(&ctx, "bank@example.com", None).await?;

    let payment = ctx
        .payment_service
        .submit_bank(user.id, method.id, "receipt.pdf".to_string(), 0)
        .await?;
    assert_eq!(payment.status, PaymentStatus::Pending);

    ctx.reconciler.verify_one(payment.id).await;

    let settled = ctx.payment_repo.find_by_id(payment.id).await?.unwrap();
    assert_eq!(settled.status, PaymentStatus::Approved);
    assert!(settled
        .proof
        .reference
        .as_deref()
        .unwrap_or("")
        .starts_with("BANK_TXN_"));

    let user = ctx.account_service.get_user(user.id).await?;
    assert_eq!(user.plan, Plan::Pro);

    // A second pass sees the record is no longer pending and does nothing
    let reference = settled.proof.reference.clone();
    ctx.reconciler.verify_one(payment.id).await;
    let unchanged = ctx.payment_repo.find_by_id(payment.id).await?.unwrap();
    assert_eq!(unchanged.proof.reference, reference);

    Ok(())
}

#[tokio::test]
async fn scan_picks_up_every_pending_bank_payment() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;
    let method = common::method_for(&ctx, RailKind::Bank).await?;

    let mut ids = Vec::new();
    for i in 0..3 {
        let user = common::create_user(&ctx, &format!("scan{}@example.com", i), None).await?;
        let payment = ctx
            .payment_service
            .submit_bank(user.id, method.id, "receipt.pdf".to_string(), 0)
            .await?;
        ids.push(payment.id);
    }

    ctx.reconciler.scan().await?;
    // Verification tasks are spawned; give them a moment to finish
    tokio::time::sleep(Duration::from_millis(200)).await;

    for id in ids {
        let payment = ctx.payment_repo.find_by_id(id).await?.unwrap();
        assert_eq!(payment.status, PaymentStatus::Approved);
    }
    assert!(ctx.payment_repo.list_pending_bank().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn in_flight_permit_blocks_concurrent_verification() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;
    let method = common::method_for(&ctx, RailKind::Bank).await?;
    let user = common::create_user(&ctx, "guard@example.com", None).await?;

    let payment = ctx
        .payment_service
        .submit_bank(user.id, method.id, "receipt.pdf".to_string(), 0)
        .await?;

    // Hold the permit as if another verification were running
    let permit = ctx.reconciler.in_flight().try_acquire(payment.id);
    assert!(permit.is_some());
    assert!(ctx.reconciler.in_flight().try_acquire(payment.id).is_none());

    ctx.reconciler.verify_one(payment.id).await;
    let untouched = ctx.payment_repo.find_by_id(payment.id).await?.unwrap();
    assert_eq!(untouched.status, PaymentStatus::Pending);

    // Dropping the permit releases the id and verification can proceed
    drop(permit);
    assert!(!ctx.reconciler.in_flight().contains(payment.id));
    ctx.reconciler.verify_one(payment.id).await;
    let settled = ctx.payment_repo.find_by_id(payment.id).await?.unwrap();
    assert_eq!(settled.status, PaymentStatus::Approved);

    Ok(())
}

#[tokio::test]
async fn declined_bank_transfer_is_rejected_with_reason() -> anyhow::Result<()> {
    let mut settings = common::test_settings();
    settings.rails.bank.decline_rate = 1.0;
    let ctx = common::test_context(&settings).await?;
    let method = common::method_for(&ctx, RailKind::Bank).await?;
    let user = common::create_user(&ctx, "flaky@example.com", None).await?;

    let payment = ctx
        .payment_service
        .submit_bank(user.id, method.id, "receipt.pdf".to_string(), 0)
        .await?;
    ctx.reconciler.verify_one(payment.id).await;

    let rejected = ctx.payment_repo.find_by_id(payment.id).await?.unwrap();
    assert_eq!(rejected.status, PaymentStatus::Rejected);
    assert!(rejected.verification_error.is_some());

    let user = ctx.account_service.get_user(user.id).await?;
    assert_eq!(user.plan, Plan::Free);

    Ok(())
}

#[tokio::test]
async fn revalidate_hands_bank_payment_back_to_the_loop() -> anyhow::Result<()> {
    let settings = common::test_settings();
    let ctx = common::test_context(&settings).await?;
    let method = common::method_for(&ctx, RailKind::Bank).await?;
    let user = common::create_user(&ctx, "retry@example.com", None).await?;

    let payment = ctx
        .payment_service
        .submit_bank(user.id, method.id, "receipt.pdf".to_string(), 0)
        .await?;
    ctx.admin_service.reject(payment.id, Some("Illegible proof".to_string())).await?;

    ctx.admin_service.revalidate(payment.id).await?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let settled = ctx.payment_repo.find_by_id(payment.id).await?.unwrap();
    assert_eq!(settled.status, PaymentStatus::Approved);

    Ok(())
}
