use chrono::{DateTime, Utc};

/// Signature of date-formatting helpers available to pages.
pub type DateFormatter = fn(&DateTime<Utc>) -> String;

/// The helper functions pages may call, registered once at startup.
#[derive(Clone, Copy)]
pub struct TemplateFuncs {
    human_date: DateFormatter,
}

impl TemplateFuncs {
    pub fn new() -> Self {
        Self { human_date }
    }

    pub fn human_date(&self, t: &DateTime<Utc>) -> String {
        (self.human_date)(t)
    }
}

impl Default for TemplateFuncs {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats a timestamp like `17 Mar 2022 at 10:15`, in UTC.
pub fn human_date(t: &DateTime<Utc>) -> String {
    t.format("%d %b %Y at %H:%M").to_string()
}
