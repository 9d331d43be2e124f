// Author: Dustin Pilgrim
// License: MIT

/// Element ids of the mounted banner.
pub const BANNER_ID: &str = "idleWarning";
pub const COUNTDOWN_ID: &str = "countdown";

/// Visible side of the monitor: the warning banner and the final navigation.
pub trait Surface: Send + Sync + 'static {
    /// Insert the (hidden) banner into the page. Called once at start.
    fn mount_banner(&self, banner: &Banner);

    fn show_banner(&self, seconds: i64);
    fn set_countdown(&self, seconds: i64);
    fn hide_banner(&self);

    /// Hard navigation; the page is expected to unload.
    fn navigate(&self, url: &str);
}

/// Markup model of the fixed warning bar at the top of the page: a heading
/// with the localized message followed by a countdown badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub message: String,
    pub badge_label: String,

    pub container_style: Vec<(&'static str, &'static str)>,
    pub heading_style: Vec<(&'static str, &'static str)>,
    pub badge_style: Vec<(&'static str, &'static str)>,
}

impl Banner {
    pub fn new(message: impl Into<String>, countdown_seconds: i64) -> Self {
        Self {
            message: message.into(),
            badge_label: format!("{countdown_seconds}s"),
            container_style: vec![
                ("display", "none"),
                ("position", "fixed"),
                ("top", "0px"),
                ("left", "0px"),
                ("width", "100%"),
                ("padding", "0 5px"),
                ("z-index", "2001"),
                ("background", "linear-gradient(to bottom, #dadada 0%,#e8e8e8 50%,#dadada 100%)"),
                ("box-shadow", "0 3px 5px rgba(0,0,0,0.2)"),
                ("border-bottom", "1px solid #eee"),
            ],
            heading_style: vec![
                ("padding", "0 0 0 25px"),
                ("font-size", "14px"),
                ("font-weight", "bold"),
                ("color", "#363636"),
                ("text-shadow", "0 1px 0 #fafafa"),
                ("margin", "12px auto"),
            ],
            badge_style: vec![
                ("display", "inline-block"),
                ("background", "linear-gradient(to bottom, #e1be37 0%,#d7791f 100%)"),
                ("border", "1px solid #98723c"),
                ("border-radius", "3px"),
                ("color", "#fff"),
                ("text-shadow", "0 1px 0 #825216"),
                ("padding", "2px 3px"),
                ("margin-left", "7px"),
                ("text-align", "center"),
                ("width", "30px"),
            ],
        }
    }

    /// Inline `style` attribute value.
    pub fn css(decls: &[(&str, &str)]) -> String {
        decls
            .iter()
            .map(|(k, v)| format!("{k}: {v};"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Banner markup, hidden until shown.
    pub fn to_html(&self) -> String {
        format!(
            r#"<div id="{BANNER_ID}" class="logoutWarning" style="{}"><h5 style="{}">{}<span id="{COUNTDOWN_ID}" class="time" style="{}">{}</span></h5></div>"#,
            Self::css(&self.container_style),
            Self::css(&self.heading_style),
            escape_html(&self.message),
            Self::css(&self.badge_style),
            escape_html(&self.badge_label),
        )
    }

    /// Plain-text rendering used by headless hosts.
    pub fn text(&self, seconds: i64) -> String {
        format!("{} {}", self.message, seconds)
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
