//! Device classification for automatic flow selection

use serde::{Deserialize, Serialize};

/// Coarse device class; tablets count as mobile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Desktop,
    Mobile,
}

/// Decides which device class the current client belongs to
pub trait DeviceClassifier: Send + Sync {
    fn classify(&self) -> DeviceClass;
}

/// A fixed class, for hosts that already know what they are
impl DeviceClassifier for DeviceClass {
    fn classify(&self) -> DeviceClass {
        *self
    }
}

/// Classifies by user-agent substrings
#[derive(Debug, Clone)]
pub struct UserAgentClassifier {
    user_agent: String,
}

impl UserAgentClassifier {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl DeviceClassifier for UserAgentClassifier {
    fn classify(&self) -> DeviceClass {
        classify_user_agent(&self.user_agent)
    }
}

/// Phones and tablets (iPad, Android without "mobile") are mobile; everything
/// else, including an empty user agent, is desktop.
pub fn classify_user_agent(user_agent: &str) -> DeviceClass {
    let ua = user_agent.to_lowercase();
    let mobile = ua.contains("mobile")
        || ua.contains("iphone")
        || ua.contains("ipod")
        || ua.contains("ipad")
        || ua.contains("android")
        || ua.contains("blackberry")
        || ua.contains("windows phone")
        || ua.contains("opera mini");
    if mobile {
        DeviceClass::Mobile
    } else {
        DeviceClass::Desktop
    }
}
