// ==========================================
// 礼品分配系统 - 合规判定纯函数库
// ==========================================
// 职责: 四类需求的规则表 + 关键词匹配
// 红线: 无状态、无副作用、无 I/O 操作
// 匹配: 大小写不敏感子串匹配（认证/BPA 关键词按大写比较, 其余按小写比较）
// ==========================================

use crate::domain::catalog::CatalogItem;
use crate::domain::requirements::{
    DietaryRequirement, MedicalRequirement, OtherRequirement, SafetyRequirement,
};

/// 无小零件判定的最小零件尺寸 (cm)
pub const MIN_SAFE_PART_SIZE_CM: f64 = 3.0;

// ==========================================
// 关键词表
// ==========================================
pub mod keywords {
    pub const PORK: &[&str] = &["свинина", "pork", "bacon", "ham", "сало", "сальная", "свиной"];

    pub const HALAL: &[&str] = &["халяль", "halal", "ذَبِيحَة", "халал", "мусульманск", "islamic"];

    pub const KOSHER: &[&str] = &["кошер", "kosher", "כָּשֵׁר", "еврейск", "jewish", "иудейск"];

    pub const NON_KOSHER: &[&str] = &[
        "свинина", "pork", "моллюски", "shellfish", "ракообразные", "crustaceans",
        "зайчатина", "hare", "верблюжатина", "camel", "хищные птицы", "birds of prey",
        "осетрина", "sturgeon", "сом", "catfish", "угорь", "eel", "акула", "shark",
    ];

    pub const ALLERGENS: &[&str] = &[
        "латекс", "latex", "шерсть", "wool", "пух", "down", "пыльца", "pollen",
        "перо", "feather", "мех", "fur", "шелк", "silk", "кашемир", "cashmere",
        "мохер", "mohair", "плюш", "plush", "ворс", "nap", "бархат", "velvet",
    ];

    /// 按大写比较
    pub const SAFETY_CERTIFICATIONS: &[&str] = &[
        "CE", "EN71", "ASTM", "ISO8124", "СТБ", "ГОСТ", "РСТ", "безопасность", "safety",
        "сертификат", "certificate", "certification", "стандарт", "standard",
        "соответствие", "compliance",
    ];

    /// 按大写比较
    pub const BPA: &[&str] = &["BPA", "бисфенол", "bisphenol", "BISPHENOL"];

    pub const FOCUS: &[&str] = &[
        "конструктор", "constructor", "пазл", "puzzle", "головоломка", "мозаика", "mosaic",
        "лабиринт", "labyrinth", "сортировщик", "логический", "logic", "стратегия",
        "strategy", "шахматы", "chess", "шашки", "checkers", "головолом", "brain teaser",
    ];

    pub const AUTISM_DESIGN: &[&str] = &[
        "сенсорный", "sensory", "тактильный", "tactile", "успокаивающий", "calming",
        "предсказуемый", "predictable", "структурированный", "структурный", "структура",
        "устойчивый", "stable", "мягкий", "soft", "тяжелый", "weighted", "антистресс",
        "anti-stress", "релакс", "relax", "медитатив", "meditative",
    ];

    pub const DIGITAL_MEDIA: &[&str] = &[
        "книга", "book", "диск", "disc", "программа", "software", "аудио", "audio",
        "видео", "video", "электронный", "electronic", "цифровой", "digital", "онлайн",
        "online", "приложение", "app", "музыка", "music", "фильм", "movie", "плеер",
        "player",
    ];

    pub const RECYCLED: &[&str] = &[
        "переработан", "recycled", "вторичн", "reclaimed", "восстановлен", "upcycled",
        "эко", "eco", "биоразлагаем", "biodegradable", "экологичн", "ecological",
        "природный", "natural", "органическ", "organic", "компостируем", "compostable",
    ];

    pub const EDUCATIONAL: &[&str] = &[
        "обучающий", "educational", "развивающий", "developmental", "научный",
        "scientific", "познавательный", "informative", "школьный", "school", "учебный",
        "study", "лаборатория", "lab", "образовательн", "education", "развитие",
        "development", "обучение", "learning", "просвещение", "enlightenment",
        "учебник", "textbook", "атлас", "atlas", "глобус", "globe", "химия", "chemistry",
        "физика", "physics", "биология", "biology", "математика", "mathematics",
        "география", "geography",
    ];

    pub const MALE_THEMED: &[&str] = &[
        "машинка", "car", "робот", "robot", "солдат", "soldier", "пистолет", "gun",
        "трансформер", "transformer", "супергерой", "superhero", "синий", "blue",
        "техника", "технический", "конструктор", "constructor", "космос", "space",
        "динозавр", "dinosaur", "гоночный", "racing", "полицейский", "police",
        "пожарный", "fire", "армия", "army", "танк", "tank", "самолет", "airplane",
    ];

    pub const FEMALE_THEMED: &[&str] = &[
        "кукла", "doll", "принцесса", "princess", "пони", "pony", "косметика",
        "cosmetics", "украшение", "jewelry", "розовый", "pink", "фея", "fairy", "балет",
        "ballet", "мода", "fashion", "русалка", "mermaid", "единорог", "unicorn",
        "сердечко", "heart", "блеск", "glitter", "пастель", "pastel", "кухня", "kitchen",
        "макияж", "makeup", "платье", "dress", "сумка", "bag",
    ];

    pub const LONG_WARRANTY: &[&str] = &[
        "гарантия", "warranty", "гарантийный", "guarantee", "пожизненный", "lifetime",
        "долгий срок", "long term", "продленная", "extended", "пятилетняя", "5 year",
        "десятилетняя", "10 year", "пожизненная", "lifelong",
    ];
}

// ==========================================
// 文本匹配
// ==========================================

/// 小写子串匹配: 任一文本包含任一关键词
fn matches_lowercase<'a, I>(texts: I, keywords: &[&str]) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    texts.into_iter().any(|text| {
        let text = text.to_lowercase();
        keywords.iter().any(|k| text.contains(&k.to_lowercase()))
    })
}

/// 大写子串匹配（认证与 BPA 关键词）
fn matches_uppercase<'a, I>(texts: I, keywords: &[&str]) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    texts.into_iter().any(|text| {
        let text = text.to_uppercase();
        keywords.iter().any(|k| text.contains(&k.to_uppercase()))
    })
}

fn name_and_category(item: &CatalogItem) -> [&str; 2] {
    [item.name.as_str(), item.category.as_str()]
}

fn strings(list: &[String]) -> impl Iterator<Item = &str> {
    list.iter().map(String::as_str)
}

/// 名称 + 材料 + 认证 + 警示
fn all_text(item: &CatalogItem) -> impl Iterator<Item = &str> {
    let meta = &item.metadata;
    std::iter::once(item.name.as_str())
        .chain(strings(&meta.materials))
        .chain(strings(&meta.certifications))
        .chain(strings(&meta.warnings))
}

// ==========================================
// ComplianceCore - 纯函数规则表
// ==========================================
pub struct ComplianceCore;

impl ComplianceCore {
    /// 饮食规则
    ///
    /// # 规则
    /// - vegetarian: 无肉无鱼, 或显式素食标记
    /// - vegan: 无肉/鱼/乳, 或显式纯素标记
    /// - halal: 认证标记, 或认证/名称含清真关键词, 或全文无猪肉关键词
    /// - kosher: 认证标记, 或认证/名称含洁食关键词, 或(全文无非洁食关键词 且 非肉乳混合)
    pub fn dietary(item: &CatalogItem, requirement: &DietaryRequirement) -> bool {
        let m = &item.metadata;
        match requirement {
            DietaryRequirement::Vegetarian => (!m.contains_meat && !m.contains_fish) || m.vegetarian,
            DietaryRequirement::Vegan => {
                (!m.contains_meat && !m.contains_fish && !m.contains_dairy) || m.vegan
            }
            DietaryRequirement::NutsAllergy => !m.contains_nuts,
            DietaryRequirement::LactoseIntolerant => !m.contains_dairy,
            DietaryRequirement::GlutenFree => !m.contains_gluten,
            DietaryRequirement::Diabetes => !m.contains_sugar || m.sugar_free,
            DietaryRequirement::Halal => Self::is_halal(item),
            DietaryRequirement::Kosher => Self::is_kosher(item),
            DietaryRequirement::Unknown(_) => true,
        }
    }

    pub fn is_halal(item: &CatalogItem) -> bool {
        let m = &item.metadata;
        if m.halal_certified {
            return true;
        }
        let certified_by_text = matches_lowercase(
            strings(&m.certifications).chain(std::iter::once(item.name.as_str())),
            keywords::HALAL,
        );
        certified_by_text || !matches_lowercase(all_text(item), keywords::PORK)
    }

    pub fn is_kosher(item: &CatalogItem) -> bool {
        let m = &item.metadata;
        if m.kosher_certified {
            return true;
        }
        let certified_by_text = matches_lowercase(
            strings(&m.certifications).chain(std::iter::once(item.name.as_str())),
            keywords::KOSHER,
        );
        if certified_by_text {
            return true;
        }
        let mixes_meat_and_dairy = m.contains_meat && m.contains_dairy;
        !mixes_meat_and_dairy && !matches_lowercase(all_text(item), keywords::NON_KOSHER)
    }

    /// 安全规则
    pub fn safety(item: &CatalogItem, requirement: &SafetyRequirement) -> bool {
        let m = &item.metadata;
        match requirement {
            SafetyRequirement::NoSmallParts => {
                !m.has_small_parts || m.small_parts_size >= MIN_SAFE_PART_SIZE_CM
            }
            SafetyRequirement::Hypoallergenic => {
                m.hypoallergenic || !matches_lowercase(strings(&m.materials), keywords::ALLERGENS)
            }
            SafetyRequirement::NonToxic => {
                m.non_toxic
                    || matches_uppercase(
                        strings(&m.certifications).chain(strings(&m.warnings)),
                        keywords::SAFETY_CERTIFICATIONS,
                    )
            }
            SafetyRequirement::Washable => m.washable,
            SafetyRequirement::FlameRetardant => m.flame_retardant,
            SafetyRequirement::BpaFree => {
                m.bpa_free
                    || !matches_uppercase(
                        strings(&m.materials).chain(strings(&m.warnings)),
                        keywords::BPA,
                    )
            }
            SafetyRequirement::Unknown(_) => true,
        }
    }

    /// 医疗规则
    pub fn medical(item: &CatalogItem, requirement: &MedicalRequirement) -> bool {
        let m = &item.metadata;
        match requirement {
            MedicalRequirement::Epilepsy => !m.has_flashing_lights,
            MedicalRequirement::Asthma => !m.has_fuzzy_material && !m.is_dusty,
            MedicalRequirement::AdhdFriendly => {
                m.calming_effect || matches_lowercase(name_and_category(item), keywords::FOCUS)
            }
            MedicalRequirement::AutismFriendly => {
                m.tactile
                    || m.predictable
                    || matches_lowercase(name_and_category(item), keywords::AUTISM_DESIGN)
            }
            MedicalRequirement::HearingAidCompatible => m.wireless_compatible,
            MedicalRequirement::WheelchairAccessible => {
                m.accessible_size
                    || matches_lowercase(name_and_category(item), keywords::DIGITAL_MEDIA)
            }
            MedicalRequirement::Unknown(_) => true,
        }
    }

    /// 其他规则
    ///
    /// gender_neutral: 标记, 或名称/类别恰好命中一组性别主题关键词以外的情况
    pub fn other(item: &CatalogItem, requirement: &OtherRequirement) -> bool {
        let m = &item.metadata;
        match requirement {
            OtherRequirement::EcoFriendly => {
                m.eco_friendly
                    || matches_lowercase(
                        strings(&m.materials).chain(std::iter::once(item.name.as_str())),
                        keywords::RECYCLED,
                    )
            }
            OtherRequirement::Educational => {
                m.educational || matches_lowercase(name_and_category(item), keywords::EDUCATIONAL)
            }
            OtherRequirement::GenderNeutral => {
                if m.gender_neutral {
                    return true;
                }
                let male = matches_lowercase(name_and_category(item), keywords::MALE_THEMED);
                let female = matches_lowercase(name_and_category(item), keywords::FEMALE_THEMED);
                male == female
            }
            OtherRequirement::Bilingual => m.bilingual,
            OtherRequirement::Sustainable => {
                (m.durable && m.repairable)
                    || matches_lowercase(
                        strings(&m.warnings).chain(std::iter::once(item.name.as_str())),
                        keywords::LONG_WARRANTY,
                    )
            }
            OtherRequirement::CharitySupported => m.charity_supported,
            OtherRequirement::Unknown(_) => true,
        }
    }
}
