use std::collections::HashMap;

use tracing::debug;

use crate::models::{
    action::UserAction, event::NormalizedUser, notification::RenderedNotification,
    template::Template,
};

const FULL_NAME_PLACEHOLDER: &str = "{full_name}";

/// Action-to-template lookup, built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    templates: HashMap<&'static str, Template>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let templates = UserAction::ALL
            .into_iter()
            .map(|action| (action.as_str(), action.template()))
            .collect();

        Self { templates }
    }

    pub fn subject(&self, action: &str) -> String {
        match self.templates.get(action) {
            Some(template) => template.subject.to_string(),
            None => format!("Notification: {}", action),
        }
    }

    pub fn body(&self, action: &str, full_name: &str) -> String {
        match self.templates.get(action) {
            Some(template) => template.body.replace(FULL_NAME_PLACEHOLDER, full_name),
            None => format!(
                "Hello {},\n\nEvent occurred: {}.\n\nRegards,\nThe team",
                full_name, action
            ),
        }
    }

    /// Never fails: unknown actions fall back to a generic subject and body.
    pub fn render(&self, action: &str, user: &NormalizedUser) -> RenderedNotification {
        let full_name = user.full_name();

        debug!(
            action,
            known = self.templates.contains_key(action),
            "Rendering notification"
        );

        RenderedNotification {
            recipient_email: user.email.clone(),
            subject: self.subject(action),
            body: self.body(action, &full_name),
            recipient_phone: user.phone.clone(),
        }
    }
}
