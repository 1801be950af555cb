/// A contact form that passed validation. Built through
/// `ContactSubmission::try_from(ContactForm)`.
#[derive(Clone, Debug)]
pub struct ContactSubmission {
    pub(super) name: String,
    pub(super) email: String,
    pub(super) subject: String,
    pub(super) message: String,
}

impl ContactSubmission {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The submitter's address, used as the `Reply-To` of the notification.
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn email_subject(&self) -> String {
        format!("Portfolio Contact: {}", self.subject)
    }

    pub fn text_body(&self) -> String {
        format!(
            "New contact form submission from your portfolio website.\n\n\
             Name: {}\n\
             Email: {}\n\
             Subject: {}\n\n\
             {}\n\n\
             Reply to: {}\n",
            self.name, self.email, self.subject, self.message, self.email
        )
    }

    /// Styled notification; every submitted value is escaped.
    pub fn html_body(&self) -> String {
        let name = ammonia::clean_text(&self.name);
        let email = ammonia::clean_text(&self.email);
        let subject = ammonia::clean_text(&self.subject);
        let message = ammonia::clean_text(&self.message);

        format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; background-color: #f9fafb; border-radius: 10px;">
    <div style="background: linear-gradient(90deg, #3B82F6, #10B981); padding: 20px; border-radius: 10px 10px 0 0;">
        <h2 style="color: white; margin: 0;">New Contact Form Submission</h2>
    </div>
    <div style="background: white; padding: 30px; border-radius: 0 0 10px 10px; box-shadow: 0 2px 4px rgba(0,0,0,0.1);">
        <p style="font-size: 16px; color: #1F2937; margin-bottom: 20px;">You have received a new message from your portfolio website:</p>
        {name_field}
        {email_field}
        {subject_field}
        {message_field}
        <div style="margin-top: 30px; padding-top: 20px; border-top: 1px solid #e5e7eb;">
            <p style="color: #6B7280; font-size: 14px; margin: 0;"><strong>Reply to:</strong> {reply_link}</p>
        </div>
    </div>
    <div style="text-align: center; margin-top: 20px; color: #6B7280; font-size: 12px;">
        <p>This message was sent from your portfolio contact form</p>
    </div>
</div>"#,
            name_field = html_field("Name", &name, ""),
            email_field = html_field("Email", &mailto_link(&email), ""),
            subject_field = html_field("Subject", &subject, ""),
            message_field = html_field("Message", &message, " white-space: pre-wrap;"),
            reply_link = mailto_link(&email),
        )
    }
}

fn html_field(label: &str, value: &str, extra_style: &str) -> String {
    format!(
        r#"<div style="background: #f3f4f6; padding: 15px; border-radius: 8px; margin-bottom: 15px;">
            <p style="margin: 5px 0; color: #6B7280; font-size: 14px;"><strong style="color: #1F2937;">{}:</strong></p>
            <p style="margin: 5px 0; color: #1F2937; font-size: 16px;{}">{}</p>
        </div>"#,
        label, extra_style, value
    )
}

fn mailto_link(escaped_email: &str) -> String {
    format!(
        r#"<a href="mailto:{0}" style="color: #3B82F6; text-decoration: none;">{0}</a>"#,
        escaped_email
    )
}
