use chrono::{Duration, Utc};
use clap::Parser;
use fake::faker::internet::en::SafeEmail;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use lumina::{
    domain::{
        CreateUserRequest, Credits, NewTokenTransaction, Payment, PaymentProof, PaymentStatus,
        Plan, RailKind, TransactionKind,
    },
    repository::{
        CreditsRepository, LedgerRepository, PaymentMethodRepository, PaymentRepository,
        SqliteCreditsRepository, SqliteLedgerRepository, SqlitePaymentMethodRepository,
        SqlitePaymentRepository, SqliteUserRepository, UserRepository,
    },
};

#[derive(Parser)]
#[command(about = "Seed the database with demo users, payments and ledger history")]
struct Args {
    /// Database to seed; falls back to DATABASE_URL, then a local file.
    #[arg(long)]
    database_url: Option<String>,

    /// Number of extra randomly generated free-tier users.
    #[arg(long, default_value_t = 5)]
    extra_users: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let database_url = args
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite:lumina.db".to_string());

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let user_repo = SqliteUserRepository::new(db_pool.clone());
    let payment_repo = SqlitePaymentRepository::new(db_pool.clone());
    let ledger_repo = SqliteLedgerRepository::new(db_pool.clone());
    let credits_repo = SqliteCreditsRepository::new(db_pool.clone());
    let method_repo = SqlitePaymentMethodRepository::new(db_pool.clone());

    println!("💳 Seeding payment methods...");
    method_repo.ensure_defaults().await?;
    let methods = method_repo.list().await?;
    let card_method = methods.iter().find(|m| m.rail == RailKind::Card).unwrap();
    let bank_method = methods.iter().find(|m| m.rail == RailKind::Bank).unwrap();
    let crypto_method = methods.iter().find(|m| m.rail == RailKind::Crypto).unwrap();

    println!("👥 Creating users...");

    // Alice: Pro subscriber who upgraded by card
    let alice = user_repo
        .create(CreateUserRequest {
            email: "alice@example.com".to_string(),
            referred_by: None,
            country: "US".to_string(),
            phone: "+1 555 0100".to_string(),
        })
        .await?;
    let now = Utc::now();
    user_repo
        .set_plan(alice.id, Plan::Pro, Some(now), Some(now + Duration::days(30)))
        .await?;
    credits_repo.set(alice.id, Credits::PRO_TIER).await?;

    let alice_payment = payment_repo
        .create(Payment {
            id: Uuid::new_v4(),
            user_id: alice.id,
            user_email: alice.email.clone(),
            method_name: card_method.name.clone(),
            rail: RailKind::Card,
            proof: PaymentProof::default(),
            status: PaymentStatus::Pending,
            created_at: now - Duration::days(2),
            plan_price_cents: 999,
            token_discount_cents: 0,
            amount_paid_cents: 999,
            tokens_debited: 0,
            verification_error: None,
            cardholder_name: Some("Alice Johnson".to_string()),
            masked_card_number: Some("**** **** **** 4242".to_string()),
        })
        .await?;
    payment_repo.mark_approved(alice_payment.id, "ch_seeded0000000001").await?;
    println!("  ✅ alice@example.com (pro, approved card payment)");

    // Bob: free-tier user referred by Alice, with a pending bank transfer
    let bob = user_repo
        .create(CreateUserRequest {
            email: "bob@example.com".to_string(),
            referred_by: Some(alice.id),
            country: "GB".to_string(),
            phone: "+44 20 5550 0200".to_string(),
        })
        .await?;
    credits_repo.set(bob.id, Credits::FREE_TIER).await?;
    ledger_repo
        .append(NewTokenTransaction {
            user_id: alice.id,
            kind: TransactionKind::ReferralSignupEarn,
            amount: 1,
            description: format!("Referred new user {}", bob.email),
            related_payment_id: None,
        })
        .await?;

    payment_repo
        .create(Payment {
            id: Uuid::new_v4(),
            user_id: bob.id,
            user_email: bob.email.clone(),
            method_name: bank_method.name.clone(),
            rail: RailKind::Bank,
            proof: PaymentProof {
                file_name: Some("transfer-receipt.pdf".to_string()),
                ..Default::default()
            },
            status: PaymentStatus::Pending,
            created_at: now - Duration::hours(1),
            plan_price_cents: 999,
            token_discount_cents: 0,
            amount_paid_cents: 999,
            tokens_debited: 0,
            verification_error: None,
            cardholder_name: None,
            masked_card_number: None,
        })
        .await?;
    println!("  ✅ bob@example.com (free, pending bank transfer)");

    // Charlie: free-tier user with a rejected crypto attempt and some spend
    let charlie = user_repo
        .create(CreateUserRequest {
            email: "charlie@example.com".to_string(),
            referred_by: Some(alice.id),
            country: "DE".to_string(),
            phone: "+49 30 555 0300".to_string(),
        })
        .await?;
    credits_repo.set(charlie.id, Credits { image: 2, video: 1, no_watermark: 2 }).await?;
    ledger_repo
        .append(NewTokenTransaction {
            user_id: alice.id,
            kind: TransactionKind::ReferralSignupEarn,
            amount: 1,
            description: format!("Referred new user {}", charlie.email),
            related_payment_id: None,
        })
        .await?;
    ledger_repo
        .append(NewTokenTransaction {
            user_id: charlie.id,
            kind: TransactionKind::AdminGrant,
            amount: 50,
            description: "Welcome grant".to_string(),
            related_payment_id: None,
        })
        .await?;
    ledger_repo
        .append(NewTokenTransaction {
            user_id: charlie.id,
            kind: TransactionKind::GoalBonusEarn,
            amount: 5,
            description: "Completed the first-week creation goal".to_string(),
            related_payment_id: None,
        })
        .await?;
    ledger_repo
        .append(NewTokenTransaction {
            user_id: charlie.id,
            kind: TransactionKind::SpendOnImage,
            amount: -10,
            description: "Generated an image".to_string(),
            related_payment_id: None,
        })
        .await?;

    let charlie_payment = payment_repo
        .create(Payment {
            id: Uuid::new_v4(),
            user_id: charlie.id,
            user_email: charlie.email.clone(),
            method_name: crypto_method.name.clone(),
            rail: RailKind::Crypto,
            proof: PaymentProof {
                hash: Some("0xdeadbeef".to_string()),
                ..Default::default()
            },
            status: PaymentStatus::Pending,
            created_at: now - Duration::days(1),
            plan_price_cents: 999,
            token_discount_cents: 0,
            amount_paid_cents: 999,
            tokens_debited: 0,
            verification_error: None,
            cardholder_name: None,
            masked_card_number: None,
        })
        .await?;
    payment_repo
        .mark_rejected(
            charlie_payment.id,
            "The provided hash does not correspond to a verifiable crypto transaction.",
        )
        .await?;
    println!("  ✅ charlie@example.com (free, rejected crypto payment, ledger history)");

    if args.extra_users > 0 {
        println!("👥 Creating {} extra users...", args.extra_users);
        for _ in 0..args.extra_users {
            let email: String = SafeEmail().fake();
            let phone: String = PhoneNumber().fake();
            let user = user_repo
                .create(CreateUserRequest {
                    email,
                    referred_by: None,
                    country: "US".to_string(),
                    phone,
                })
                .await?;
            credits_repo.set(user.id, Credits::FREE_TIER).await?;
        }
    }

    println!("✨ Seeding complete.");
    Ok(())
}
