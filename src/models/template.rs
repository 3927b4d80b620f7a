/// Subject line plus a plain-text body with a `{full_name}` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub subject: &'static str,
    pub body: &'static str,
}
