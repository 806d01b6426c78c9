use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    config::SmtpConfig,
    domain::{Payment, User},
};

/// Outbound payment emails. Sends are fire-and-forget: every method returns
/// immediately and failures are logged, never propagated into settlement.
pub trait Notifier: Send + Sync {
    fn payment_success(&self, user: &User, payment: &Payment);
    fn payment_pending(&self, user: &User, payment: &Payment);
    fn payment_rejected(&self, user: &User, payment: &Payment, reason: &str);
}

fn greeting_name(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

fn success_body(user: &User, payment: &Payment) -> (String, String) {
    let subject = "Your Lumina Pro upgrade is complete".to_string();
    let body = format!(
        "Hi {},\n\n\
         Great news! Your payment of ${:.2} via {} has been successfully processed.\n\n\
         Your account has been upgraded to the Pro plan with unlimited image and \
         video generations and watermark-free exports.\n\n\
         — The Lumina team\n",
        greeting_name(&user.email),
        payment.amount_paid_usd(),
        payment.method_name,
    );
    (subject, body)
}

fn pending_body(user: &User, payment: &Payment) -> (String, String) {
    let subject = "We received your payment".to_string();
    let body = format!(
        "Hi {},\n\n\
         Your {} payment of ${:.2} is being verified. You will be notified as \
         soon as your Pro plan is active.\n\n\
         — The Lumina team\n",
        greeting_name(&user.email),
        payment.method_name,
        payment.amount_paid_usd(),
    );
    (subject, body)
}

fn rejected_body(user: &User, payment: &Payment, reason: &str) -> (String, String) {
    let subject = "There was a problem with your payment".to_string();
    let body = format!(
        "Hi {},\n\n\
         Unfortunately we could not process your {} payment of ${:.2}.\n\n\
         Reason: {}\n\n\
         No charge has been applied to your plan. You can retry from the \
         upgrade page at any time.\n\n\
         — The Lumina team\n",
        greeting_name(&user.email),
        payment.method_name,
        payment.amount_paid_usd(),
        reason,
    );
    (subject, body)
}

/// SMTP-backed notifier used when mail settings are configured.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn from_config(config: &SmtpConfig) -> Option<Self> {
        let host = config.host.as_deref()?;
        let from_address = config.from_address.as_deref()?;
        let from: Mailbox = from_address.parse().ok()?;

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::relay(host).ok()?;
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Some(Self { transport: builder.build(), from })
    }

    fn send(&self, to: &str, subject: String, body: String) {
        let to: Mailbox = match to.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                tracing::warn!("Skipping email to unparsable address {}: {}", to, e);
                return;
            }
        };

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .body(body);

        let message = match message {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Failed to build email: {}", e);
                return;
            }
        };

        let transport = self.transport.clone();
        tokio::spawn(async move {
            if let Err(e) = transport.send(message).await {
                tracing::error!("Failed to send email: {}", e);
            }
        });
    }
}

impl Notifier for SmtpNotifier {
    fn payment_success(&self, user: &User, payment: &Payment) {
        let (subject, body) = success_body(user, payment);
        self.send(&user.email, subject, body);
    }

    fn payment_pending(&self, user: &User, payment: &Payment) {
        let (subject, body) = pending_body(user, payment);
        self.send(&user.email, subject, body);
    }

    fn payment_rejected(&self, user: &User, payment: &Payment, reason: &str) {
        let (subject, body) = rejected_body(user, payment, reason);
        self.send(&user.email, subject, body);
    }
}

/// Log-only notifier used when SMTP is not configured (and in tests).
#[derive(Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn payment_success(&self, user: &User, payment: &Payment) {
        tracing::info!(
            "Email (success) to {}: payment {} via {} approved",
            user.email,
            payment.id,
            payment.method_name
        );
    }

    fn payment_pending(&self, user: &User, payment: &Payment) {
        tracing::info!(
            "Email (pending) to {}: payment {} via {} is under review",
            user.email,
            payment.id,
            payment.method_name
        );
    }

    fn payment_rejected(&self, user: &User, payment: &Payment, reason: &str) {
        tracing::info!(
            "Email (rejected) to {}: payment {} rejected: {}",
            user.email,
            payment.id,
            reason
        );
    }
}
