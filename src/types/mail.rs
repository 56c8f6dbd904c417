use serde::Serialize;

#[derive(Serialize, Debug, Clone)]
pub struct SendEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: Option<String>,
    pub text: Option<String>,
    pub reply_to: Option<Vec<String>>,
}

impl Default for SendEmail {
    fn default() -> Self {
        Self {
            from: "noreply@example.com".to_string(),
            to: vec![],
            subject: "".to_string(),
            html: None,
            text: None,
            reply_to: None,
        }
    }
}

/// Values substituted into the invite email.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct InviteEmail {
    pub recipient: String,
    pub site_name: String,
    pub email_self: String,
    pub link: String,
}

impl InviteEmail {
    pub fn into_send_email(self, from: &str) -> SendEmail {
        let text = format!(
            "{} invited you to collaborate on \"{}\". Register here: {}",
            self.email_self, self.site_name, self.link
        );
        let html = format!(
            "<p>{} invited you to collaborate on <b>{}</b>.</p><p><a href=\"{}\">Accept the invite</a></p>",
            self.email_self, self.site_name, self.link
        );
        SendEmail {
            from: from.to_string(),
            to: vec![self.recipient],
            subject: format!("Invitation to {}", self.site_name),
            html: Some(html),
            text: Some(text),
            reply_to: Some(vec![self.email_self]),
        }
    }
}
