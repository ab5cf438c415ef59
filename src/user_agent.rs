//! Third-party cookie heuristic based on the user agent.
//!
//! The answer is only a hint used to decide whether a direct REST read is worth
//! trying. The empirical probe in the read flow always has the last word.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserFamily {
    Chrome,
    Edge,
    Opera,
    SamsungInternet,
    Brave,
    Firefox,
    Safari,
    /// Any browser on iOS, which all run on WebKit whatever their branding
    IosWebKit,
    Unknown,
}

impl Display for BrowserFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BrowserFamily::Chrome => "Chrome",
            BrowserFamily::Edge => "Edge",
            BrowserFamily::Opera => "Opera",
            BrowserFamily::SamsungInternet => "Samsung Internet",
            BrowserFamily::Brave => "Brave",
            BrowserFamily::Firefox => "Firefox",
            BrowserFamily::Safari => "Safari",
            BrowserFamily::IosWebKit => "iOS WebKit",
            BrowserFamily::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Browser {
    pub family: BrowserFamily,
    pub major_version: Option<u32>,
}

/// First Firefox release with Enhanced Tracking Protection on by default.
const FIREFOX_ETP_VERSION: u32 = 69;

lazy_static! {
    // Order matters: Chromium derivatives also advertise "Chrome/" and "Safari/".
    static ref RULES: Vec<(BrowserFamily, Regex)> = vec![
        (BrowserFamily::IosWebKit, Regex::new(r"(?:CriOS|FxiOS|EdgiOS|OPiOS)/(\d+)").unwrap()),
        (BrowserFamily::Brave, Regex::new(r"Brave(?:/(\d+))?").unwrap()),
        (BrowserFamily::Edge, Regex::new(r"Edg(?:e|A)?/(\d+)").unwrap()),
        (BrowserFamily::Opera, Regex::new(r"OPR/(\d+)").unwrap()),
        (BrowserFamily::SamsungInternet, Regex::new(r"SamsungBrowser/(\d+)").unwrap()),
        (BrowserFamily::Firefox, Regex::new(r"Firefox/(\d+)").unwrap()),
        (BrowserFamily::Chrome, Regex::new(r"(?:Chrome|Chromium)/(\d+)").unwrap()),
        (BrowserFamily::Safari, Regex::new(r"Version/(\d+)[^ ]* (?:Mobile/\S+ )?Safari/").unwrap()),
    ];
}

pub fn parse_browser(user_agent: &str) -> Browser {
    for (family, re) in RULES.iter() {
        if let Some(caps) = re.captures(user_agent) {
            let major_version = caps.get(1).and_then(|m| m.as_str().parse().ok());
            return Browser { family: *family, major_version };
        }
    }

    Browser { family: BrowserFamily::Unknown, major_version: None }
}

/// Whether third-party cookies are likely to work in this browser.
pub fn is_browser_known_to_support_3pc(user_agent: &str) -> bool {
    let browser = parse_browser(user_agent);

    let supported = match browser.family {
        BrowserFamily::Chrome
        | BrowserFamily::Edge
        | BrowserFamily::Opera
        | BrowserFamily::SamsungInternet => true,
        BrowserFamily::Firefox => browser
            .major_version
            .is_some_and(|v| v < FIREFOX_ETP_VERSION),
        BrowserFamily::Brave
        | BrowserFamily::Safari
        | BrowserFamily::IosWebKit
        | BrowserFamily::Unknown => false,
    };

    log::debug!(
        "Browser {} {:?}: third-party cookies {}",
        browser.family,
        browser.major_version,
        if supported { "expected" } else { "not expected" }
    );
    supported
}
