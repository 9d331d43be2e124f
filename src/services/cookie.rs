// Author: Dustin Pilgrim
// License: MIT

use std::sync::Arc;

use crate::core::config::MonitorConfig;

/// `document.cookie` as seen from one page.
pub trait CookieJar: Send + Sync + 'static {
    /// All visible cookies, `"name=value; name2=value2"`.
    fn read_all(&self) -> String;

    /// Assign one cookie, `"name=value;path=/;domain=..."`.
    fn write(&self, assignment: &str);
}

/// Shared activity timestamp, stored in a session cookie that every page on
/// the cookie domain can read.
///
/// Pages race on this value without any locking; a stale read is corrected on
/// the next poll.
pub struct ActivityStore {
    jar: Arc<dyn CookieJar>,
    name: String,
    domain: String,

    // Highest value read or written during this session.
    high_water: Option<u64>,
}

impl ActivityStore {
    pub fn new(jar: Arc<dyn CookieJar>, cfg: &MonitorConfig) -> Self {
        Self {
            jar,
            name: cfg.cookie_name.clone(),
            domain: cfg.cookie_domain.clone(),
            high_water: None,
        }
    }

    /// Current shared timestamp, or `None` when the cookie is missing or not a number.
    ///
    /// A value lower than one already observed is stale and ignored.
    pub fn read(&mut self) -> Option<u64> {
        let raw = self.jar.read_all();

        let parsed = match find_cookie(&raw, &self.name) {
            Some(v) => match v.trim().parse::<u64>() {
                Ok(ms) => Some(ms),
                Err(_) => {
                    tracing::debug!("activity cookie {} is not a timestamp: {:?}", self.name, v);
                    None
                }
            },
            None => {
                tracing::debug!("activity cookie {} not present", self.name);
                None
            }
        };

        match (parsed, self.high_water) {
            (Some(ms), Some(hw)) if ms < hw => {
                tracing::warn!(
                    "activity cookie went backwards ({} < {}); ignoring stale value",
                    ms,
                    hw
                );
                Some(hw)
            }
            (Some(ms), _) => {
                self.high_water = Some(ms);
                Some(ms)
            }
            (None, _) => None,
        }
    }

    pub fn write(&mut self, at_ms: u64) {
        let assignment = format!("{}={};path=/;domain={}", self.name, at_ms, self.domain);
        self.jar.write(&assignment);

        self.high_water = Some(self.high_water.map_or(at_ms, |hw| hw.max(at_ms)));
    }

    pub fn high_water(&self) -> Option<u64> {
        self.high_water
    }
}

/// Value of the first cookie named exactly `name`.
pub fn find_cookie<'a>(raw: &'a str, name: &str) -> Option<&'a str> {
    raw.split(';')
        .map(str::trim_start)
        .find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k == name).then_some(v)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RawJar {
        raw: Mutex<String>,
        writes: Mutex<Vec<String>>,
    }

    impl CookieJar for RawJar {
        fn read_all(&self) -> String {
            self.raw.lock().unwrap().clone()
        }

        fn write(&self, assignment: &str) {
            self.writes.lock().unwrap().push(assignment.to_string());
        }
    }

    fn store(raw: &str) -> (Arc<RawJar>, ActivityStore) {
        let jar = Arc::new(RawJar::default());
        *jar.raw.lock().unwrap() = raw.to_string();
        let cfg = MonitorConfig::from_params(1, ".example.com", "/logout", "x").unwrap();
        let store = ActivityStore::new(jar.clone(), &cfg);
        (jar, store)
    }

    #[test]
    fn finds_exact_name_first_occurrence() {
        let raw = "XIdleCheck=1; IdleCheckX=2; IdleCheck=300; IdleCheck=400";
        assert_eq!(find_cookie(raw, "IdleCheck"), Some("300"));
        assert_eq!(find_cookie(raw, "Missing"), None);
        assert_eq!(find_cookie("", "IdleCheck"), None);
    }

    #[test]
    fn reads_decimal_value() {
        let (_jar, mut st) = store("session=abc; IdleCheck=1700000000123");
        assert_eq!(st.read(), Some(1_700_000_000_123));
    }

    #[test]
    fn missing_or_garbage_cookie_reads_none() {
        let (_jar, mut absent) = store("session=abc");
        assert_eq!(absent.read(), None);

        let (_jar, mut garbage) = store("IdleCheck=undefined");
        assert_eq!(garbage.read(), None);
    }

    #[test]
    fn write_formats_session_cookie() {
        let (jar, mut store) = store("");
        store.write(42);
        assert_eq!(
            jar.writes.lock().unwrap().as_slice(),
            ["IdleCheck=42;path=/;domain=.example.com"]
        );
        assert_eq!(store.high_water(), Some(42));
    }

    #[test]
    fn regressed_value_is_treated_as_stale() {
        let (jar, mut store) = store("IdleCheck=5000");
        assert_eq!(store.read(), Some(5000));

        *jar.raw.lock().unwrap() = "IdleCheck=1000".to_string();
        assert_eq!(store.read(), Some(5000));

        *jar.raw.lock().unwrap() = "IdleCheck=7000".to_string();
        assert_eq!(store.read(), Some(7000));
    }
}
