use crate::config;
use crate::model::panels;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    About,
    Articles,
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AboutPage {
    #[default]
    About,
    Skills,
    Experience,
}

impl AboutPage {
    /// Texture shown on the large About board for this page.
    pub fn texture_key(self) -> &'static str {
        match self {
            AboutPage::About => "about_page",
            AboutPage::Skills => "skills_page",
            AboutPage::Experience => "exp_page",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocialLink {
    LinkedIn,
    GitHub,
    Mail,
    Twitter,
}

impl SocialLink {
    pub fn url(self) -> &'static str {
        match self {
            SocialLink::LinkedIn => config::LINKEDIN_URL,
            SocialLink::GitHub => config::GITHUB_URL,
            SocialLink::Mail => config::MAIL_URL,
            SocialLink::Twitter => config::TWITTER_URL,
        }
    }
}

/// What clicking a named mesh asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hotspot {
    Open(Section),
    Back,
    AboutTab(AboutPage),
    CreditsFlip,
    Link(SocialLink),
}

impl Hotspot {
    pub fn from_name(name: &str) -> Option<Self> {
        let hotspot = match name {
            // signboard and lettering on the pole model
            "Pub-Cocksign_Pub-About_0" | "Text_ABOUT" => Hotspot::Open(Section::About),
            "Pub-Cocksign_Pub-Articles_0" | "Text_ARTICLES" => Hotspot::Open(Section::Articles),
            "Pub-Cocksign_Pub-Project_0" | "TEXT_PROJECT" => Hotspot::Open(Section::Project),

            panels::PROJECT_BACK | panels::ABOUT_BACK | panels::CREDITS_LINKS => Hotspot::Back,
            panels::CREDITS_COVER => Hotspot::CreditsFlip,
            panels::ABOUT_TAB_ABOUT => Hotspot::AboutTab(AboutPage::About),
            panels::ABOUT_TAB_SKILLS => Hotspot::AboutTab(AboutPage::Skills),
            panels::ABOUT_TAB_EXPERIENCE => Hotspot::AboutTab(AboutPage::Experience),
            panels::LINK_LINKEDIN => Hotspot::Link(SocialLink::LinkedIn),
            panels::LINK_GITHUB => Hotspot::Link(SocialLink::GitHub),
            panels::LINK_MAIL => Hotspot::Link(SocialLink::Mail),
            panels::LINK_TWITTER => Hotspot::Link(SocialLink::Twitter),
            _ => return None,
        };
        Some(hotspot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pole_sign_and_lettering_open_the_same_section() {
        assert_eq!(Hotspot::from_name("Text_ABOUT"), Hotspot::from_name("Pub-Cocksign_Pub-About_0"));
        assert_eq!(Hotspot::from_name("TEXT_PROJECT"), Some(Hotspot::Open(Section::Project)));
        assert_eq!(
            Hotspot::from_name("Pub-Cocksign_Pub-Articles_0"),
            Some(Hotspot::Open(Section::Articles))
        );
    }

    #[test]
    fn every_view_has_a_back_hotspot() {
        for name in [panels::PROJECT_BACK, panels::ABOUT_BACK, panels::CREDITS_LINKS] {
            assert_eq!(Hotspot::from_name(name), Some(Hotspot::Back));
        }
    }

    #[test]
    fn decorative_meshes_are_not_hotspots() {
        assert_eq!(Hotspot::from_name("Object_8"), None);
        assert_eq!(Hotspot::from_name(panels::ABOUT_PAGE), None);
        assert_eq!(Hotspot::from_name(""), None);
    }

    #[test]
    fn links_resolve_to_urls() {
        match Hotspot::from_name(panels::LINK_GITHUB) {
            Some(Hotspot::Link(link)) => assert!(link.url().starts_with("https://github.com/")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(SocialLink::Mail.url().starts_with("mailto:"));
    }
}
