//! The resume snapshot – the complete, immutable-in-use data model the
//! composition engine consumes.
//!
//! A snapshot is always handled as a whole: the engine never mutates
//! individual fields in place, it receives a fresh snapshot and recomputes
//! the page plan from scratch. The only mutation surface exposed here is
//! the set of capped `add_*_image` helpers, which enforce the per-collection
//! cardinality limits at the editing boundary.

use serde::{Deserialize, Deserializer, Serialize};

/// Maximum number of hobby photos on the hobbies page.
pub const MAX_HOBBY_IMAGES: usize = 5;
/// Maximum number of social-practice photos.
pub const MAX_SOCIAL_IMAGES: usize = 4;
/// Maximum number of portfolio photos.
pub const MAX_PORTFOLIO_IMAGES: usize = 8;
/// Maximum number of specialty tags.
pub const MAX_SPECIALTIES: usize = 3;

/// Structural layout template applied to the whole booklet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutTemplate {
    #[default]
    Classic,
    Modern,
    Storybook,
}

impl LayoutTemplate {
    /// Parse a CLI/user-facing template name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "classic" => Some(Self::Classic),
            "modern" => Some(Self::Modern),
            "storybook" => Some(Self::Storybook),
            _ => None,
        }
    }
}

/// Named gradient preset for the header band. Presets only contribute the
/// two gradient stops; every other token is derived from the accent color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemePreset {
    DopaminePink,
    DopamineYellow,
    DopamineBlue,
    DopaminePurple,
    DopamineOrange,
    MacaronMint,
    MacaronPurple,
    MacaronPeach,
    MacaronSky,
    MacaronCream,
    ChineseInk,
    ChineseCyan,
    ChineseRed,
    ChineseGold,
    ChineseJade,
    RetroBrown,
    RetroGreen,
    RetroNavy,
    RetroWine,
    RetroSlate,
    CyberNeon,
    CyberElectric,
    CyberAcid,
    NatureForest,
    NatureSunset,
    NatureOcean,
    NatureDesert,
    #[default]
    OceanGradient,
}

impl ThemePreset {
    /// Gradient stops for the header band, `(from, to)` hex colors.
    pub fn gradient(self) -> (&'static str, &'static str) {
        match self {
            Self::DopaminePink => ("#ff4d4f", "#ff85c0"),
            Self::DopamineYellow => ("#fadb14", "#ffe58f"),
            Self::DopamineBlue => ("#1890ff", "#69c0ff"),
            Self::DopaminePurple => ("#722ed1", "#b37feb"),
            Self::DopamineOrange => ("#fa8c16", "#ffd666"),
            Self::MacaronMint => ("#d9f7be", "#b7eb8f"),
            Self::MacaronPurple => ("#efdbff", "#d3adf7"),
            Self::MacaronPeach => ("#ffd8bf", "#ffbb96"),
            Self::MacaronSky => ("#bae7ff", "#91d5ff"),
            Self::MacaronCream => ("#fffbe6", "#fff1b8"),
            Self::ChineseInk => ("#262626", "#595959"),
            Self::ChineseCyan => ("#1d39c4", "#597ef7"),
            Self::ChineseRed => ("#a8071a", "#cf1322"),
            Self::ChineseGold => ("#874d00", "#d4b106"),
            Self::ChineseJade => ("#237804", "#73d13d"),
            Self::RetroBrown => ("#873800", "#ad4e00"),
            Self::RetroGreen => ("#00474f", "#006d75"),
            Self::RetroNavy => ("#002766", "#003a8c"),
            Self::RetroWine => ("#5c0011", "#a8071a"),
            Self::RetroSlate => ("#262626", "#434343"),
            Self::CyberNeon => ("#eb2f96", "#722ed1"),
            Self::CyberElectric => ("#0050b3", "#4096ff"),
            Self::CyberAcid => ("#a0d911", "#7cb305"),
            Self::NatureForest => ("#135200", "#52c41a"),
            Self::NatureSunset => ("#d4380d", "#faad14"),
            Self::NatureOcean => ("#003a8c", "#0050b3"),
            Self::NatureDesert => ("#874d00", "#d4b106"),
            Self::OceanGradient => ("#0ea5e9", "#38bdf8"),
        }
    }
}

/// Decorative composition drawn around the avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarFrame {
    Plain,
    #[default]
    Ring,
    Wreath,
    Polygon,
    Playful,
    Crayon,
    Stamp,
    PaperCut,
    Cartoon,
}

/// Clipping shape applied to the avatar image itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlineShape {
    #[default]
    Circle,
    Square,
    Hexagon,
    Shield,
}

impl OutlineShape {
    /// Hexagon and Shield require polygon clip paths; Circle and Square
    /// are plain corner-radius clips.
    pub fn is_polygon_clip(self) -> bool {
        matches!(self, Self::Hexagon | Self::Shield)
    }
}

/// Display shape for hobby photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HobbyShape {
    #[default]
    Circle,
    Square,
    Diamond,
    Hexagon,
}

/// One captioned image in a collection. `image` is an opaque reference
/// (typically a base64 data URI) – the engine never decodes or validates
/// the bytes. `id` is stable and unique within its collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptionedImage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub caption: String,
}

impl CaptionedImage {
    pub fn new(id: &str, image: &str, caption: &str) -> Self {
        Self {
            id: id.to_string(),
            image: image.to_string(),
            caption: caption.to_string(),
        }
    }
}

/// Accept both the current captioned shape and the legacy plain-string
/// form (`["data:image/..."]`) older saves used.
pub(crate) fn de_image_list<'de, D>(de: D) -> Result<Vec<CaptionedImage>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Legacy(String),
        Captioned(CaptionedImage),
    }

    let entries: Vec<Entry> = Vec::deserialize(de).unwrap_or_default();
    Ok(entries
        .into_iter()
        .map(|e| match e {
            Entry::Legacy(url) => CaptionedImage {
                id: String::new(),
                image: url,
                caption: String::new(),
            },
            Entry::Captioned(item) => item,
        })
        .collect())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyMember {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub relation: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub job: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Award {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub level: String,
}

impl Award {
    /// True when the record carries any user content at all.
    pub fn has_content(&self) -> bool {
        !self.name.is_empty() || !self.date.is_empty() || !self.level.is_empty()
    }

    /// Default award list used to pad short or empty award sets so the
    /// honors timeline never renders half-empty.
    pub fn defaults() -> Vec<Award> {
        let rows = [
            ("1", "National Youth Informatics Olympiad, First Prize", "National", "2023"),
            ("2", "District Merit Student", "District", "2022"),
            ("3", "City Student Computer Works Contest, First Prize", "City", "2023"),
            ("4", "Hope Cup Mathematics Invitational, First Prize", "National", "2022"),
            ("5", "Outstanding Young Pioneer", "School", "2023"),
            ("6", "Cambridge Young Learners English, Level 3 Merit", "International", "2021"),
            ("7", "Spring Bud Composition Contest, First Prize", "National", "2022"),
            ("8", "School Sports Day 100m, First Place", "School", "2023"),
        ];
        rows.iter()
            .map(|(id, name, level, date)| Award {
                id: id.to_string(),
                name: name.to_string(),
                date: date.to_string(),
                level: level.to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectScore {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// One semester row in the grade table: a fixed set of named subject scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeRow {
    #[serde(default)]
    pub row_name: String,
    #[serde(default)]
    pub subjects: Vec<SubjectScore>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub birthday: String,
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub intended_school: String,
    #[serde(default)]
    pub motto: String,
    /// Opaque image reference for the avatar.
    #[serde(default)]
    pub avatar: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub wechat: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverSettings {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub slogan: String,
    #[serde(default)]
    pub background_image: String,
    #[serde(default = "default_true")]
    pub show_avatar: bool,
    #[serde(default)]
    pub avatar_frame: AvatarFrame,
    #[serde(default)]
    pub avatar_shape: OutlineShape,
}

impl Default for CoverSettings {
    fn default() -> Self {
        Self {
            title: String::new(),
            subtitle: String::new(),
            slogan: String::new(),
            background_image: String::new(),
            show_avatar: true,
            avatar_frame: AvatarFrame::default(),
            avatar_shape: OutlineShape::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackCoverSettings {
    #[serde(default)]
    pub background_image: String,
    #[serde(default = "default_true")]
    pub show_avatar: bool,
    #[serde(default)]
    pub avatar_frame: AvatarFrame,
    #[serde(default)]
    pub avatar_shape: OutlineShape,
}

impl Default for BackCoverSettings {
    fn default() -> Self {
        Self {
            background_image: String::new(),
            show_avatar: true,
            avatar_frame: AvatarFrame::default(),
            avatar_shape: OutlineShape::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    #[serde(default)]
    pub website: String,
    #[serde(default, deserialize_with = "de_image_list")]
    pub images: Vec<CaptionedImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hobbies {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default, deserialize_with = "de_image_list")]
    pub images: Vec<CaptionedImage>,
    #[serde(default)]
    pub image_shape: HobbyShape,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialPractice {
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "de_image_list")]
    pub images: Vec<CaptionedImage>,
}

/// The full editable profile at one instant. The composition engine only
/// ever sees complete snapshots; field-level edits happen upstream and are
/// committed by whole-snapshot replacement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeSnapshot {
    // Style selectors
    #[serde(default = "default_accent")]
    pub accent_color: String,
    #[serde(default)]
    pub layout: LayoutTemplate,
    #[serde(default)]
    pub theme_preset: ThemePreset,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default)]
    pub page_background: String,

    // Covers
    #[serde(default)]
    pub cover: CoverSettings,
    #[serde(default)]
    pub back_cover: BackCoverSettings,

    // Identity
    #[serde(default)]
    pub basic_info: BasicInfo,
    #[serde(default)]
    pub contact: Contact,
    #[serde(default)]
    pub family: Vec<FamilyMember>,
    #[serde(default)]
    pub grades: Vec<GradeRow>,

    // Honors
    #[serde(default)]
    pub awards: Vec<Award>,
    #[serde(default)]
    pub awards_quote: String,

    // Image collections
    #[serde(default, deserialize_with = "de_image_list")]
    pub quality_reports: Vec<CaptionedImage>,
    #[serde(default, deserialize_with = "de_image_list")]
    pub certificates: Vec<CaptionedImage>,
    #[serde(default)]
    pub portfolio: Portfolio,
    #[serde(default)]
    pub hobbies: Hobbies,
    #[serde(default)]
    pub social_practice: SocialPractice,

    // Narrative
    #[serde(default)]
    pub cover_letter: String,
    #[serde(default)]
    pub cover_letter_image: String,
    #[serde(default)]
    pub recommendation_image: String,
    #[serde(default)]
    pub closing_message: String,
}

fn default_true() -> bool {
    true
}

fn default_accent() -> String {
    "#0ea5e9".to_string()
}

/// Push `item` into a capped collection, rejecting overflow and duplicate
/// ids with a user-facing message.
fn push_capped(
    list: &mut Vec<CaptionedImage>,
    cap: usize,
    label: &str,
    item: CaptionedImage,
) -> Result<(), String> {
    if list.len() >= cap {
        return Err(format!("At most {cap} {label} images are allowed"));
    }
    if list.iter().any(|existing| existing.id == item.id) {
        return Err(format!("Duplicate {label} image id {:?}", item.id));
    }
    list.push(item);
    Ok(())
}

impl ResumeSnapshot {
    /// Default accent used when the stored one is malformed.
    pub fn fallback_accent() -> &'static str {
        "#0ea5e9"
    }

    pub fn add_hobby_image(&mut self, item: CaptionedImage) -> Result<(), String> {
        push_capped(&mut self.hobbies.images, MAX_HOBBY_IMAGES, "hobby", item)
    }

    pub fn add_social_practice_image(&mut self, item: CaptionedImage) -> Result<(), String> {
        push_capped(
            &mut self.social_practice.images,
            MAX_SOCIAL_IMAGES,
            "social-practice",
            item,
        )
    }

    pub fn add_portfolio_image(&mut self, item: CaptionedImage) -> Result<(), String> {
        push_capped(
            &mut self.portfolio.images,
            MAX_PORTFOLIO_IMAGES,
            "portfolio",
            item,
        )
    }

    /// Uncapped collections still reject duplicate ids.
    pub fn add_certificate(&mut self, item: CaptionedImage) -> Result<(), String> {
        push_capped(&mut self.certificates, usize::MAX, "certificate", item)
    }

    pub fn add_quality_report(&mut self, item: CaptionedImage) -> Result<(), String> {
        push_capped(&mut self.quality_reports, usize::MAX, "quality-report", item)
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(id: &str) -> CaptionedImage {
        CaptionedImage::new(id, "data:image/png;base64,AAAA", "")
    }

    #[test]
    fn hobby_cap_enforced() {
        let mut snap = ResumeSnapshot::default();
        for i in 0..MAX_HOBBY_IMAGES {
            snap.add_hobby_image(img(&format!("h{i}"))).unwrap();
        }
        let before = snap.hobbies.images.len();
        assert!(snap.add_hobby_image(img("h-overflow")).is_err());
        assert_eq!(snap.hobbies.images.len(), before);
    }

    #[test]
    fn social_and_portfolio_caps_enforced() {
        let mut snap = ResumeSnapshot::default();
        for i in 0..MAX_SOCIAL_IMAGES {
            snap.add_social_practice_image(img(&format!("s{i}"))).unwrap();
        }
        assert!(snap.add_social_practice_image(img("s-overflow")).is_err());
        assert_eq!(snap.social_practice.images.len(), MAX_SOCIAL_IMAGES);

        for i in 0..MAX_PORTFOLIO_IMAGES {
            snap.add_portfolio_image(img(&format!("p{i}"))).unwrap();
        }
        assert!(snap.add_portfolio_image(img("p-overflow")).is_err());
        assert_eq!(snap.portfolio.images.len(), MAX_PORTFOLIO_IMAGES);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut snap = ResumeSnapshot::default();
        snap.add_certificate(img("c1")).unwrap();
        assert!(snap.add_certificate(img("c1")).is_err());
        assert_eq!(snap.certificates.len(), 1);
    }

    #[test]
    fn legacy_string_image_arrays_deserialize() {
        let json = r#"{
            "certificates": ["data:image/png;base64,AAAA", {"id": "c2", "image": "x", "caption": "Cap"}]
        }"#;
        let snap: ResumeSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.certificates.len(), 2);
        assert_eq!(snap.certificates[0].image, "data:image/png;base64,AAAA");
        assert_eq!(snap.certificates[1].caption, "Cap");
    }

    #[test]
    fn snapshot_json_round_trip() {
        let mut snap = ResumeSnapshot::default();
        snap.basic_info.name = "Alex".to_string();
        snap.layout = LayoutTemplate::Modern;
        snap.add_hobby_image(img("h1")).unwrap();
        let json = snap.to_json();
        let back: ResumeSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
