// SPDX-FileCopyrightText: 2024 Joshua Jewell
// SPDX-License-Identifier: MIT

//! Question templates.
//!
//! Every building gets the same bank of 16 question/answer pairs:
//! 4 categories x 2 languages x 2 phrasings. Answers are filled from the
//! building catalog; when a field (or the whole entry) is missing the raw
//! building identifier or a generic placeholder is used instead.

use crate::catalog::BuildingInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    En,
    Cn,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Cn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Cn => "cn",
        }
    }

    /// Chinese if any character lies in the CJK Unified Ideographs block.
    pub fn detect(text: &str) -> Self {
        if text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c)) {
            Language::Cn
        } else {
            Language::En
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Identify,
    History,
    Location,
    Function,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Identify,
        Category::History,
        Category::Location,
        Category::Function,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

impl QaPair {
    fn new(question: &str, answer: String) -> Self {
        Self {
            question: question.to_string(),
            answer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaGroup {
    pub category: Category,
    pub en: [QaPair; 2],
    pub cn: [QaPair; 2],
}

impl QaGroup {
    pub fn pairs(&self, language: Language) -> &[QaPair; 2] {
        match language {
            Language::En => &self.en,
            Language::Cn => &self.cn,
        }
    }
}

/// The 16 template pairs for one building, in category order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    pub groups: Vec<QaGroup>,
}

impl QuestionBank {
    /// All pairs of one language: identify, history, location, function.
    pub fn pairs(&self, language: Language) -> impl Iterator<Item = &QaPair> {
        self.groups
            .iter()
            .flat_map(move |group| group.pairs(language).iter())
    }

    pub fn len(&self) -> usize {
        self.groups.len() * Language::ALL.len() * 2
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Resolved template fields with fallbacks applied.
struct Fields<'a> {
    en_name: &'a str,
    cn_name: &'a str,
    description_en: Option<&'a str>,
    description_cn: Option<&'a str>,
    location: Option<&'a str>,
    year_built: Option<&'a str>,
    features: Option<&'a [String]>,
}

static NO_INFO: BuildingInfo = BuildingInfo {
    en_name: None,
    cn_name: None,
    description_en: None,
    description_cn: None,
    location: None,
    year_built: None,
    architect: None,
    features: None,
};

impl<'a> Fields<'a> {
    fn resolve(building: &'a str, info: Option<&'a BuildingInfo>) -> Self {
        let info = info.unwrap_or(&NO_INFO);
        Self {
            en_name: info.en_name.as_deref().unwrap_or(building),
            cn_name: info.cn_name.as_deref().unwrap_or(building),
            description_en: info.description_en.as_deref(),
            description_cn: info.description_cn.as_deref(),
            location: info.location.as_deref(),
            year_built: info.year_built.as_deref(),
            features: info.features.as_deref(),
        }
    }
}

/// Builds the question bank for `building`. `info` is `None` when the
/// catalog has no entry for it.
pub fn question_bank(building: &str, info: Option<&BuildingInfo>) -> QuestionBank {
    let f = Fields::resolve(building, info);
    let en = f.en_name;
    let cn = f.cn_name;
    let desc_en = f.description_en.unwrap_or("");
    let desc_cn = f.description_cn.unwrap_or("");
    let year_en = f.year_built.unwrap_or("unknown year");
    let year_cn = f.year_built.unwrap_or("未知年份");
    let location_en = f.location.unwrap_or("HKU campus");
    let location_cn = f.location.unwrap_or("港大校园");
    let features_en = f
        .features
        .map(|list| list.join(", "))
        .unwrap_or_else(|| "various facilities".to_string());
    let features_cn = f
        .features
        .map(|list| list.join(", "))
        .unwrap_or_else(|| "各种设施".to_string());

    let groups = Category::ALL
        .iter()
        .map(|&category| match category {
            Category::Identify => QaGroup {
                category,
                en: [
                    QaPair::new(
                        "What building is shown in this image?",
                        format!("This is the {en} of the University of Hong Kong."),
                    ),
                    QaPair::new(
                        "Can you identify this HKU building?",
                        format!("Yes, this is the {en}. {desc_en}"),
                    ),
                ],
                cn: [
                    QaPair::new("这张图片展示的是什么建筑？", format!("这是香港大学的{cn}。")),
                    QaPair::new("你能识别这座港大建筑吗？", format!("这是{cn}。{desc_cn}")),
                ],
            },
            Category::History => QaGroup {
                category,
                en: [
                    QaPair::new(
                        "When was this building constructed?",
                        format!("The {en} was built in {year_en}."),
                    ),
                    QaPair::new(
                        "Tell me about the history of this building.",
                        format!("The {en} was constructed in {year_en}. {desc_en}"),
                    ),
                ],
                cn: [
                    QaPair::new("这座建筑是什么时候建造的？", format!("{cn}建于{year_cn}年。")),
                    QaPair::new(
                        "介绍一下这座建筑的历史。",
                        format!("{cn}建于{year_cn}年。{desc_cn}"),
                    ),
                ],
            },
            Category::Location => QaGroup {
                category,
                en: [
                    QaPair::new(
                        "Where is this building located on campus?",
                        format!("The {en} is located at {location_en}."),
                    ),
                    QaPair::new(
                        "How can I find this building?",
                        format!(
                            "This is the {en}, located at {location_en}. You can access it from the main entrance."
                        ),
                    ),
                ],
                cn: [
                    QaPair::new(
                        "这座建筑在校园的什么位置？",
                        format!("{cn}位于{location_cn}。"),
                    ),
                    QaPair::new(
                        "如何找到这座建筑？",
                        format!("这是{cn}，位于{location_cn}。您可以从主入口进入。"),
                    ),
                ],
            },
            Category::Function => QaGroup {
                category,
                en: [
                    QaPair::new(
                        "What is the function of this building?",
                        format!(
                            "The {en} serves as {}.",
                            f.description_en.unwrap_or("an important facility at HKU")
                        ),
                    ),
                    QaPair::new(
                        "What facilities are available in this building?",
                        format!("The {en} features {features_en}."),
                    ),
                ],
                cn: [
                    QaPair::new(
                        "这座建筑的功能是什么？",
                        format!("{cn}{}。", f.description_cn.unwrap_or("是港大的重要设施")),
                    ),
                    QaPair::new("这座建筑里有什么设施？", format!("{cn}内设有{features_cn}。")),
                ],
            },
        })
        .collect();

    QuestionBank { groups }
}
