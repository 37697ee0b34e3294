//! Review request emails.
//!
//! Bodies are rendered with Askama templates and composed with lettre (plain
//! text plus HTML alternative) but never handed to a transport: delivery is
//! simulated with a fixed delay and a log line.

use std::time::Duration;

use askama::Template;
use chrono::{DateTime, Utc};
use lettre::{
    Message,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
};
use serde::Deserialize;
use thiserror::Error;

/// Subject used when the merchant has not customized one.
pub const DEFAULT_SUBJECT: &str = "How was your recent purchase?";

/// Body used when the merchant has not customized one.
pub const DEFAULT_BODY: &str = "Hi {{customer_name}},

We hope you're loving your recent purchase of {{product_name}}! We'd love to hear about your experience.

Your feedback helps other customers make informed decisions and helps us improve our products.

Leave a review: {{review_link}}

Thanks for choosing us!
The Team";

const REVIEW_LINK_PLACEHOLDER: &str = "{{review_link}}";

/// HTML template for the review request. Each line is split around the
/// review link placeholder; the template puts a button in every gap.
#[derive(Template)]
#[template(path = "email/review_request.html")]
struct ReviewRequestHtml<'a> {
    lines: Vec<Vec<&'a str>>,
    review_link: &'a str,
}

/// Plain text template for the review request.
#[derive(Template)]
#[template(path = "email/review_request.txt")]
struct ReviewRequestText<'a> {
    lines: Vec<Vec<&'a str>>,
    review_link: &'a str,
}

/// Errors that can occur when composing an email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Merchant-supplied template overrides. Empty fields fall back to the
/// defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailTemplate {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Values substituted into `{{placeholders}}`.
#[derive(Debug, Clone, Copy)]
pub struct ReviewEmailContext<'a> {
    pub customer_name: &'a str,
    pub product_name: &'a str,
    pub order_number: &'a str,
    pub review_link: &'a str,
    pub shop_domain: &'a str,
}

/// A personalized review request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Receipt for a simulated delivery.
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub id: String,
    pub sent_at: DateTime<Utc>,
}

/// Personalize a template.
///
/// The subject knows customer, product and order number; the body also
/// knows the review link and shop domain. In the HTML part the review link
/// becomes a button and newlines become `<br>`.
///
/// # Errors
///
/// Returns `EmailError::Template` if a body template fails to render.
pub fn render(
    template: &EmailTemplate,
    ctx: &ReviewEmailContext<'_>,
) -> Result<RenderedEmail, EmailError> {
    let subject_template = template
        .subject
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SUBJECT);
    let body_template = template
        .body
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_BODY);

    let subject = substitute_common(subject_template, ctx);
    let body = substitute_common(body_template, ctx).replace("{{shop_domain}}", ctx.shop_domain);

    let html = ReviewRequestHtml {
        lines: body_lines(&body),
        review_link: ctx.review_link,
    }
    .render()?;
    let text = ReviewRequestText {
        lines: body_lines(&body),
        review_link: ctx.review_link,
    }
    .render()?;

    Ok(RenderedEmail {
        subject,
        text,
        html,
    })
}

fn substitute_common(template: &str, ctx: &ReviewEmailContext<'_>) -> String {
    template
        .replace("{{customer_name}}", ctx.customer_name)
        .replace("{{product_name}}", ctx.product_name)
        .replace("{{order_number}}", ctx.order_number)
}

fn body_lines(body: &str) -> Vec<Vec<&str>> {
    body.split('\n')
        .map(|line| line.split(REVIEW_LINK_PLACEHOLDER).collect())
        .collect()
}

/// Composes review emails and simulates their delivery.
#[derive(Clone)]
pub struct ReviewEmailService {
    from: Mailbox,
    delivery_delay: Duration,
}

impl ReviewEmailService {
    /// Create a new email service.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::InvalidAddress` if `from` is not a mailbox.
    pub fn new(from: &str, delivery_delay: Duration) -> Result<Self, EmailError> {
        let from = from
            .parse()
            .map_err(|_| EmailError::InvalidAddress(from.to_string()))?;
        Ok(Self {
            from,
            delivery_delay,
        })
    }

    /// Compose the message for `to` and simulate sending it.
    ///
    /// # Errors
    ///
    /// Returns error if `to` is not a valid address or the message cannot be
    /// built.
    pub async fn send(&self, to: &str, email: &RenderedEmail) -> Result<SentEmail, EmailError> {
        let message = self.compose(to, email)?;

        tokio::time::sleep(self.delivery_delay).await;

        let sent_at = Utc::now();
        let id = format!("email_{}", sent_at.timestamp_millis());

        tracing::info!(
            to = %to,
            subject = %email.subject,
            email_id = %id,
            size = message.formatted().len(),
            "Review request email sent (simulated)"
        );

        Ok(SentEmail { id, sent_at })
    }

    fn compose(&self, to: &str, email: &RenderedEmail) -> Result<Message, EmailError> {
        let to: Mailbox = to
            .parse()
            .map_err(|_| EmailError::InvalidAddress(to.to_string()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html.clone()),
                    ),
            )?;

        Ok(message)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ctx() -> ReviewEmailContext<'static> {
        ReviewEmailContext {
            customer_name: "Ada",
            product_name: "Walnut Desk",
            order_number: "#1042",
            review_link: "https://reviews.example.com/r/abc?x=1&y=2",
            shop_domain: "demo.myshopify.com",
        }
    }

    #[test]
    fn test_default_template() {
        let email = render(&EmailTemplate::default(), &ctx()).unwrap();

        assert_eq!(email.subject, "How was your recent purchase?");
        assert!(email.text.starts_with("Hi Ada,\n\n"));
        assert!(email.text.contains("recent purchase of Walnut Desk!"));
        assert!(
            email
                .text
                .contains("Leave a review: https://reviews.example.com/r/abc?x=1&y=2")
        );
        assert!(!email.text.contains("{{"));
    }

    #[test]
    fn test_custom_template_substitutions() {
        let template = EmailTemplate {
            subject: Some("{{customer_name}}, thoughts on {{product_name}} ({{order_number}})?".into()),
            body: Some("Order {{order_number}} from {{shop_domain}}: {{review_link}} {{review_link}}".into()),
        };

        let email = render(&template, &ctx()).unwrap();

        assert_eq!(email.subject, "Ada, thoughts on Walnut Desk (#1042)?");
        assert_eq!(
            email.text,
            "Order #1042 from demo.myshopify.com: https://reviews.example.com/r/abc?x=1&y=2 https://reviews.example.com/r/abc?x=1&y=2"
        );
    }

    #[test]
    fn test_subject_ignores_body_only_placeholders() {
        let template = EmailTemplate {
            subject: Some("Visit {{shop_domain}}".into()),
            body: None,
        };
        assert_eq!(render(&template, &ctx()).unwrap().subject, "Visit {{shop_domain}}");
    }

    #[test]
    fn test_empty_overrides_fall_back() {
        let template = EmailTemplate {
            subject: Some(String::new()),
            body: Some(String::new()),
        };
        let email = render(&template, &ctx()).unwrap();
        assert_eq!(email.subject, DEFAULT_SUBJECT);
        assert!(email.text.contains("Thanks for choosing us!"));
    }

    #[test]
    fn test_html_rendering() {
        let template = EmailTemplate {
            subject: None,
            body: Some("Hi <{{customer_name}}>\n{{review_link}}".into()),
        };

        let email = render(&template, &ctx()).unwrap();

        assert!(!email.html.contains("<Ada>"));
        assert!(email.html.contains("Ada"));
        assert!(email.html.contains("<br><a href=\"https://reviews.example.com/r/abc?x=1"));
        assert!(!email.html.contains("x=1&y=2"));
        assert!(email.html.contains(">Leave a Review</a>"));
        assert!(!email.html.contains("{{"));
        assert_eq!(email.text, "Hi <Ada>\nhttps://reviews.example.com/r/abc?x=1&y=2");
    }

    #[test]
    fn test_html_escapes_merchant_markup() {
        let template = EmailTemplate {
            subject: None,
            body: Some("<script>alert('{{product_name}}')</script> & \"more\"".into()),
        };

        let email = render(&template, &ctx()).unwrap();

        assert!(!email.html.contains("<script>"));
        assert!(!email.html.contains("</script>"));
        assert!(!email.html.contains("\"more\""));
        assert!(email.html.contains("script"));
        assert!(email.text.starts_with("<script>alert('Walnut Desk')</script>"));
    }

    #[test]
    fn test_button_for_each_link_placeholder() {
        let template = EmailTemplate {
            subject: None,
            body: Some("{{review_link}} or {{review_link}}".into()),
        };

        let email = render(&template, &ctx()).unwrap();

        assert_eq!(email.html.matches(">Leave a Review</a>").count(), 2);
        assert!(email.html.contains("</a> or <a href="));
    }

    #[tokio::test]
    async fn test_send_rejects_bad_recipient() {
        let service = ReviewEmailService::new("reviews@trustloop.app", Duration::ZERO).unwrap();
        let email = render(&EmailTemplate::default(), &ctx()).unwrap();

        let err = service.send("not an address", &email).await.unwrap_err();
        assert!(matches!(err, EmailError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn test_send_returns_receipt() {
        let service = ReviewEmailService::new("TrustLoop <reviews@trustloop.app>", Duration::ZERO)
            .unwrap();
        let email = render(&EmailTemplate::default(), &ctx()).unwrap();

        let sent = service.send("ada@example.com", &email).await.unwrap();
        assert!(sent.id.starts_with("email_"));
    }

    #[test]
    fn test_invalid_sender_rejected() {
        assert!(ReviewEmailService::new("nope", Duration::ZERO).is_err());
    }
}
