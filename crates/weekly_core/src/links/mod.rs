//! Deep links: which external action a task's link opens, and how it looks.

use crate::model::{LinkData, NONE_LINK, Task};

mod dispatch;

pub use dispatch::{DispatchMode, Dispatcher, SystemDispatcher, dispatch_mode};

pub const CALENDAR_WEEK_URL: &str = "https://calendar.google.com/calendar/r/week";
pub const SPOTIFY_FALLBACK_URL: &str = "https://open.spotify.com";

/// Builds an openable URL from a link payload, or `None` when the payload
/// is missing what the link needs.
pub type Resolver = fn(&LinkData) -> Option<String>;

#[derive(Debug, Clone)]
pub struct LinkKind {
    pub tag: String,
    pub icon: String,
    pub label: String,
    resolver: Resolver,
}

impl LinkKind {
    pub fn new<T, I, L>(tag: T, icon: I, label: L, resolver: Resolver) -> Self
    where
        T: Into<String>,
        I: Into<String>,
        L: Into<String>,
    {
        Self {
            tag: tag.into(),
            icon: icon.into(),
            label: label.into(),
            resolver,
        }
    }

    pub fn resolve(&self, data: &LinkData) -> Option<String> {
        (self.resolver)(data)
    }
}

/// Open registry of link kinds keyed by tag. `none` is always present.
#[derive(Debug, Clone)]
pub struct LinkRegistry {
    kinds: Vec<LinkKind>,
}

impl Default for LinkRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LinkRegistry {
    /// A registry that only knows `none`.
    pub fn new() -> Self {
        Self {
            kinds: vec![LinkKind::new(NONE_LINK, "❌", "None", no_link)],
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(LinkKind::new("whatsapp", "💬", "WhatsApp", whatsapp_link));
        registry.register(LinkKind::new("calendar", "📅", "Calendar", calendar_link));
        registry.register(LinkKind::new("email", "✉️", "Email", email_link));
        registry.register(LinkKind::new("spotify", "🎵", "Spotify", spotify_link));
        registry
    }

    /// Adds `kind`, replacing any kind with the same tag in place.
    pub fn register(&mut self, kind: LinkKind) {
        match self.kinds.iter_mut().find(|existing| existing.tag == kind.tag) {
            Some(existing) => *existing = kind,
            None => self.kinds.push(kind),
        }
    }

    pub fn get(&self, tag: &str) -> Option<&LinkKind> {
        self.kinds.iter().find(|kind| kind.tag == tag)
    }

    pub fn is_known(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    /// Display metadata; unknown tags describe as `none`.
    pub fn describe(&self, tag: &str) -> &LinkKind {
        self.get(tag).unwrap_or(&self.kinds[0])
    }

    pub fn resolve(&self, tag: &str, data: &LinkData) -> Option<String> {
        self.get(tag).and_then(|kind| kind.resolve(data))
    }

    pub fn resolve_task(&self, task: &Task) -> Option<String> {
        self.resolve(&task.link_type, &task.link_data)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &LinkKind> {
        self.kinds.iter()
    }
}

fn field<'a>(data: &'a LinkData, key: &str) -> Option<&'a str> {
    data.get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

/// Keeps digits and `+`, then drops one leading `+`.
pub fn normalize_phone(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '+')
        .collect();
    kept.strip_prefix('+').unwrap_or(&kept).to_string()
}

fn no_link(_data: &LinkData) -> Option<String> {
    None
}

fn whatsapp_link(data: &LinkData) -> Option<String> {
    let phone = normalize_phone(field(data, "phone")?);
    if phone.is_empty() {
        return None;
    }

    let mut url = format!("https://wa.me/{phone}");
    if let Some(message) = field(data, "message") {
        url.push_str("?text=");
        url.push_str(&urlencoding::encode(message));
    }
    Some(url)
}

fn calendar_link(_data: &LinkData) -> Option<String> {
    Some(CALENDAR_WEEK_URL.to_string())
}

fn email_link(data: &LinkData) -> Option<String> {
    let email = field(data, "email")?;
    let mut url = format!("mailto:{email}");
    if let Some(subject) = field(data, "subject") {
        url.push_str("?subject=");
        url.push_str(&urlencoding::encode(subject));
    }
    Some(url)
}

fn spotify_link(data: &LinkData) -> Option<String> {
    Some(
        field(data, "url")
            .unwrap_or(SPOTIFY_FALLBACK_URL)
            .to_string(),
    )
}
