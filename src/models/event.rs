use serde_json::Value as JsonValue;

/// User attributes resolved from whichever naming convention the producer used.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedUser {
    pub id: JsonValue,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: String,
}

impl NormalizedUser {
    /// First and last name joined by one space, trimmed. Empty when both are empty.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub action: String,
    pub user: NormalizedUser,
    pub timestamp: String,
}
