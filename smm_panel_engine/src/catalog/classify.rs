use std::fmt::{Display, Formatter};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

//--------------------------------------      Platform        ---------------------------------------------------------

/// The platforms the storefront sells for. Detection order matters: the first platform whose pattern matches
/// wins, so `ALL` is the authoritative ordering, not an implementation detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Facebook,
    X,
    Telegram,
    Tiktok,
    Youtube,
}

impl Platform {
    pub const ALL: [Platform; 6] =
        [Platform::Instagram, Platform::Facebook, Platform::X, Platform::Telegram, Platform::Tiktok, Platform::Youtube];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
            Platform::X => "x",
            Platform::Telegram => "telegram",
            Platform::Tiktok => "tiktok",
            Platform::Youtube => "youtube",
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//--------------------------------------     ServiceType      ---------------------------------------------------------

/// What is being delivered. As with [`Platform`], `ALL` fixes both the scoring order and the tie-break: on
/// equal scores the type listed earlier wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Comments,
    Likes,
    Followers,
    Views,
    Shares,
    Votes,
    Saves,
}

impl ServiceType {
    pub const ALL: [ServiceType; 7] = [
        ServiceType::Comments,
        ServiceType::Likes,
        ServiceType::Followers,
        ServiceType::Views,
        ServiceType::Shares,
        ServiceType::Votes,
        ServiceType::Saves,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Comments => "comments",
            ServiceType::Likes => "likes",
            ServiceType::Followers => "followers",
            ServiceType::Views => "views",
            ServiceType::Shares => "shares",
            ServiceType::Votes => "votes",
            ServiceType::Saves => "saves",
        }
    }
}

impl Display for ServiceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//--------------------------------------    Regex tables      ---------------------------------------------------------

lazy_static! {
    static ref PLATFORM_PATTERNS: [(Platform, Regex); 6] = [
        (Platform::Instagram, Regex::new(r"(?i)(\binstagram\b|\big\b|\binsta\b)").unwrap()),
        (Platform::Facebook, Regex::new(r"(?i)\bfacebook\b|\bfb\b").unwrap()),
        (Platform::X, Regex::new(r"(?i)\btwitter\b|\bX\b").unwrap()),
        (Platform::Telegram, Regex::new(r"(?i)\btelegram\b|\btg\b").unwrap()),
        (Platform::Tiktok, Regex::new(r"(?i)\btiktok\b|\btt\b").unwrap()),
        (Platform::Youtube, Regex::new(r"(?i)\byoutube\b|\byt\b").unwrap()),
    ];
    static ref TYPE_PATTERNS: [(ServiceType, Regex); 7] = [
        (ServiceType::Comments, Regex::new(r"(?i)\bcomment(s)?\b|\brepl(y|ies)\b|\breview(s)?\b").unwrap()),
        (ServiceType::Likes, Regex::new(r"(?i)\blike(s)?\b|\bheart(s)?\b|\breaction(s)?\b").unwrap()),
        (ServiceType::Followers, Regex::new(r"(?i)\bfollow(er)?(s)?\b|\bsubscriber(s)?\b|\bmember(s)?\b").unwrap()),
        (ServiceType::Views, Regex::new(r"(?i)\bview(s)?\b|\bplay(s)?\b|\bwatch(es)?\b|\bimpression(s)?\b|\breach\b").unwrap()),
        (ServiceType::Shares, Regex::new(r"(?i)\bshare(s)?\b|\brepost(s)?\b|\bretweet(s)?\b|\bforward(s)?\b").unwrap()),
        (ServiceType::Votes, Regex::new(r"(?i)\bvote(s)?\b|\bpoll(s)?\b").unwrap()),
        (ServiceType::Saves, Regex::new(r"(?i)\bsave(s)?\b|\bbookmark(s)?\b|\bsaved\b").unwrap()),
    ];
    static ref VARIANT_PATTERNS: Vec<(Platform, Vec<(&'static str, Regex)>)> = vec![
        (Platform::Instagram, vec![
            ("reel", Regex::new(r"(?i)\breel").unwrap()),
            ("story", Regex::new(r"(?i)\bstory|stories").unwrap()),
            ("igtv", Regex::new(r"(?i)\bigtv\b").unwrap()),
            ("live", Regex::new(r"(?i)\blive\b").unwrap()),
            ("video", Regex::new(r"(?i)\bvideo\b").unwrap()),
            ("post", Regex::new(r"(?i)\bpost|photo|image").unwrap()),
        ]),
        (Platform::Facebook, vec![
            ("video", Regex::new(r"(?i)\bvideo\b").unwrap()),
            ("post", Regex::new(r"(?i)\bpost\b").unwrap()),
            ("live", Regex::new(r"(?i)\blive\b").unwrap()),
        ]),
        (Platform::X, vec![
            ("post", Regex::new(r"(?i)tweet|post").unwrap()),
            ("video", Regex::new(r"(?i)video").unwrap()),
        ]),
        (Platform::Telegram, vec![
            ("post", Regex::new(r"(?i)post|channel|group").unwrap()),
        ]),
        (Platform::Tiktok, vec![
            ("video", Regex::new(r"(?i)video").unwrap()),
            ("live", Regex::new(r"(?i)live").unwrap()),
            ("post", Regex::new(r"(?i)post").unwrap()),
        ]),
        (Platform::Youtube, vec![
            ("short", Regex::new(r"(?i)short").unwrap()),
            ("video", Regex::new(r"(?i)video").unwrap()),
            ("live", Regex::new(r"(?i)live").unwrap()),
            ("post", Regex::new(r"(?i)post|community").unwrap()),
        ]),
    ];
    static ref HARD_EXCLUDE: Regex = Regex::new(r"(?i)(\bdm\b|direct\s*message|inbox)").unwrap();
}

fn haystack(category: &str, name: &str) -> String {
    format!("{category} {name}").to_lowercase()
}

fn count_matches(rx: &Regex, text: &str) -> usize {
    rx.find_iter(text).count()
}

//--------------------------------------    Classification    ---------------------------------------------------------

/// First platform whose pattern matches `category + " " + name`, in `Platform::ALL` order.
pub fn classify_platform(category: &str, name: &str) -> Option<Platform> {
    let hay = haystack(category, name);
    PLATFORM_PATTERNS.iter().find(|(_, rx)| rx.is_match(&hay)).map(|(p, _)| *p)
}

/// Services that mention direct messages or inboxes are never classified, whatever else their text says.
pub fn is_hard_excluded(category: &str, name: &str) -> bool {
    HARD_EXCLUDE.is_match(&haystack(category, name))
}

/// Scored type detection. Each candidate scores `2 × matches(category + name) + 10 × matches(category)`, so a
/// category mention outweighs five name mentions. The highest strictly positive score wins; ties go to the
/// type listed earlier in `ServiceType::ALL`. Hard-excluded text scores nothing.
pub fn classify_type(category: &str, name: &str) -> Option<ServiceType> {
    let hay = haystack(category, name);
    if HARD_EXCLUDE.is_match(&hay) {
        return None;
    }
    let cat_hay = category.to_lowercase();

    let mut best = None;
    let mut best_score = 0;
    for (service_type, rx) in TYPE_PATTERNS.iter() {
        let score = count_matches(rx, &hay) * 2 + count_matches(rx, &cat_hay) * 10;
        if score > best_score {
            best = Some(*service_type);
            best_score = score;
        }
    }
    best
}

/// First matching variant in the platform's table, defaulting to `"any"`.
pub fn classify_variant(platform: Platform, category: &str, name: &str) -> &'static str {
    let hay = haystack(category, name);
    VARIANT_PATTERNS
        .iter()
        .find(|(p, _)| *p == platform)
        .and_then(|(_, table)| table.iter().find(|(_, rx)| rx.is_match(&hay)))
        .map(|(variant, _)| *variant)
        .unwrap_or("any")
}

//--------------------------------------  Lexical fallbacks   ---------------------------------------------------------

/// Last-resort platform detection for services whose regex classification failed but which carry a curated
/// category. Plain substring containment, in a fixed order.
pub fn platform_from_category(category: &str) -> Option<Platform> {
    let low = category.to_lowercase();
    if low.contains("instagram") {
        Some(Platform::Instagram)
    } else if low.contains("youtube") {
        Some(Platform::Youtube)
    } else if low.contains("facebook") {
        Some(Platform::Facebook)
    } else if low.contains("tiktok") {
        Some(Platform::Tiktok)
    } else if low.contains("telegram") {
        Some(Platform::Telegram)
    } else if low.contains("twitter") || low.contains(" x ") {
        Some(Platform::X)
    } else {
        None
    }
}

/// Last-resort type detection over `category + " " + name`. Deliberately narrower than the scored pass: only
/// the five everyday keywords are recognised.
pub fn type_from_keywords(category: &str, name: &str) -> Option<ServiceType> {
    let low = haystack(category, name);
    if low.contains("follower") {
        Some(ServiceType::Followers)
    } else if low.contains("like") {
        Some(ServiceType::Likes)
    } else if low.contains("view") {
        Some(ServiceType::Views)
    } else if low.contains("comment") {
        Some(ServiceType::Comments)
    } else if low.contains("share") {
        Some(ServiceType::Shares)
    } else {
        None
    }
}
