//! Resource paths used in `Location` headers.

use codecamp_core::TalkId;

pub const API_ROOT: &str = "/api";

pub trait LinkGenerator: Send + Sync {
    /// `None` when `moniker` cannot form a path segment.
    fn camp_path(&self, moniker: &str) -> Option<String>;

    fn talk_path(&self, moniker: &str, talk_id: TalkId) -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct RouteLinkGenerator {
    root: String,
}

impl RouteLinkGenerator {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    fn segment(raw: &str) -> Option<&str> {
        let s = raw.trim();
        let ok = !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_graphic() && !matches!(c, '/' | '?' | '#' | '%'));
        ok.then_some(s)
    }
}

impl Default for RouteLinkGenerator {
    fn default() -> Self {
        Self::new(API_ROOT)
    }
}

impl LinkGenerator for RouteLinkGenerator {
    fn camp_path(&self, moniker: &str) -> Option<String> {
        let moniker = Self::segment(moniker)?;
        Some(format!("{}/camps/{moniker}", self.root))
    }

    fn talk_path(&self, moniker: &str, talk_id: TalkId) -> Option<String> {
        if !talk_id.is_assigned() {
            return None;
        }
        let camp = self.camp_path(moniker)?;
        Some(format!("{camp}/talks/{talk_id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn builds_camp_and_talk_paths() {
        let links = RouteLinkGenerator::default();
        assert_eq!(links.camp_path("ATL2018").as_deref(), Some("/api/camps/ATL2018"));
        assert_eq!(
            links.talk_path("ATL2018", TalkId::new(3)).as_deref(),
            Some("/api/camps/ATL2018/talks/3")
        );
    }

    #[test]
    fn rejects_unusable_monikers() {
        let links = RouteLinkGenerator::default();
        for bad in ["", "   ", "a/b", "a b", "what?", "x#y", "caf\u{e9}"] {
            assert_eq!(links.camp_path(bad), None, "{bad:?}");
        }
        assert_eq!(links.talk_path("ATL2018", TalkId::UNASSIGNED), None);
    }

    proptest! {
        #[test]
        fn safe_monikers_always_link(m in "[A-Za-z0-9_.-]{1,64}") {
            let links = RouteLinkGenerator::default();
            let path = links.camp_path(&m).unwrap();
            prop_assert_eq!(path, format!("/api/camps/{m}"));
        }

        #[test]
        fn slashes_never_link(a in "[A-Za-z0-9]{0,8}", b in "[A-Za-z0-9]{0,8}") {
            let links = RouteLinkGenerator::default();
            let joined = format!("{a}/{b}");
            prop_assert_eq!(links.camp_path(&joined), None);
        }
    }
}
