use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, info};

use crate::config::SmtpConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)?.port(cfg.port);
        if let (Some(user), Some(pass)) = (&cfg.user, &cfg.pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self {
            transport: builder.build(),
            from: cfg.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        let email = Message::builder()
            .from(self.from.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())?;
        self.transport.send(email).await?;
        info!(%to, "email sent");
        Ok(())
    }
}

/// Mailer that drops everything; used by `AppState::fake()` in tests.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> anyhow::Result<()> {
        debug!(%to, %subject, "noop mailer: dropping email");
        Ok(())
    }
}

// --- templates ---

pub fn new_project_email(
    follower_name: &str,
    uploader_name: &str,
    project_title: &str,
    project_description: &str,
    project_url: &str,
) -> (String, String) {
    let subject = format!("{uploader_name} telah mengupload project baru!");
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>Halo {follower_name}!</h2>
  <p><strong>{uploader_name}</strong> yang kamu follow telah mengupload project baru:</p>
  <div style="background-color: #f5f5f5; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <h3 style="margin-top: 0;">{project_title}</h3>
    <p style="color: #666;">{project_description}</p>
  </div>
  <a href="{project_url}" style="display: inline-block; background-color: #0070f3; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; margin-top: 10px;">
    Lihat Project
  </a>
  <p style="margin-top: 30px; color: #999; font-size: 12px;">
    Email ini dikirim otomatis karena kamu mengikuti {uploader_name}.
  </p>
</div>"#
    );
    (subject, html)
}

pub fn project_liked_email(
    owner_name: &str,
    liker_name: &str,
    project_title: &str,
    project_url: &str,
) -> (String, String) {
    let subject = format!("{liker_name} menyukai project kamu!");
    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>Halo {owner_name}!</h2>
  <p><strong>{liker_name}</strong> telah menyukai project kamu:</p>
  <div style="background-color: #f5f5f5; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <h3 style="margin-top: 0;">{project_title}</h3>
  </div>
  <a href="{project_url}" style="display: inline-block; background-color: #0070f3; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; margin-top: 10px;">
    Lihat Project
  </a>
  <p style="margin-top: 30px; color: #999; font-size: 12px;">
    Email notifikasi dari Sistem Informasi Akademi
  </p>
</div>"#
    );
    (subject, html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_mailer_always_succeeds() {
        let mailer = NoopMailer;
        mailer
            .send("someone@example.com", "subject", "<p>hi</p>")
            .await
            .expect("noop send should never fail");
    }

    #[test]
    fn new_project_email_mentions_uploader_and_link() {
        let (subject, html) = new_project_email(
            "Budi",
            "Siti",
            "Game Demo",
            "Sebuah game kecil",
            "http://localhost:3000/project/abc",
        );
        assert_eq!(subject, "Siti telah mengupload project baru!");
        assert!(html.contains("Halo Budi!"));
        assert!(html.contains("Game Demo"));
        assert!(html.contains("http://localhost:3000/project/abc"));
    }

    #[test]
    fn project_liked_email_mentions_liker() {
        let (subject, html) =
            project_liked_email("Siti", "Budi", "Blog App", "http://localhost:3000/project/x");
        assert_eq!(subject, "Budi menyukai project kamu!");
        assert!(html.contains("Halo Siti!"));
        assert!(html.contains("Blog App"));
    }
}
