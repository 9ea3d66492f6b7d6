// ==========================================
// 礼品分配系统 - 特殊需求定义
// ==========================================
// 职责: 四类封闭需求枚举 (饮食/安全/医疗/其他)
// 说明: 需求名称在输入边界解析一次; 未识别名称保留为 Unknown
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// 需求枚举生成宏
// ==========================================
// 每个类别生成: 枚举 + as_str/description/parse + 字符串序列化
macro_rules! requirement_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $unknown_desc:literal {
            $( $variant:ident => $key:literal, $desc:literal; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $( $variant, )+
            /// 未识别的需求名称（按策略放行）
            Unknown(String),
        }

        impl $name {
            /// 全部已知变体
            pub const KNOWN: &'static [$name] = &[ $( $name::$variant, )+ ];

            /// 解析需求名称（大小写不敏感，未识别时返回 Unknown）
            pub fn parse(raw: &str) -> Self {
                match raw.trim().to_ascii_lowercase().as_str() {
                    $( $key => $name::$variant, )+
                    _ => $name::Unknown(raw.trim().to_string()),
                }
            }

            pub fn as_str(&self) -> &str {
                match self {
                    $( $name::$variant => $key, )+
                    $name::Unknown(raw) => raw.as_str(),
                }
            }

            pub fn description(&self) -> &'static str {
                match self {
                    $( $name::$variant => $desc, )+
                    $name::Unknown(_) => $unknown_desc,
                }
            }

            pub fn is_known(&self) -> bool {
                !matches!(self, $name::Unknown(_))
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                $name::parse(&raw)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

requirement_enum! {
    /// 饮食需求
    DietaryRequirement, "未知饮食需求" {
        Vegetarian => "vegetarian", "素食 - 不含肉类与鱼类";
        Vegan => "vegan", "纯素 - 不含任何动物来源成分";
        NutsAllergy => "nuts_allergy", "坚果过敏 - 不含坚果";
        LactoseIntolerant => "lactose_intolerant", "乳糖不耐 - 不含乳制品";
        GlutenFree => "gluten_free", "无麸质 - 不含小麦/大麦/黑麦";
        Diabetes => "diabetes", "糖尿病 - 无糖或使用代糖";
        Halal => "halal", "清真 - 符合伊斯兰饮食规范";
        Kosher => "kosher", "洁食 - 符合犹太饮食规范";
    }
}

requirement_enum! {
    /// 安全需求
    SafetyRequirement, "未知安全需求" {
        NoSmallParts => "no_small_parts", "无小零件 - 零件尺寸不小于 3cm";
        Hypoallergenic => "hypoallergenic", "低致敏 - 材料不含过敏原";
        NonToxic => "non_toxic", "无毒 - 具备安全认证";
        Washable => "washable", "可清洗";
        FlameRetardant => "flame_retardant", "阻燃材料";
        BpaFree => "bpa_free", "不含双酚A";
    }
}

requirement_enum! {
    /// 医疗需求
    MedicalRequirement, "未知医疗需求" {
        Epilepsy => "epilepsy", "癫痫 - 避免闪烁灯光";
        Asthma => "asthma", "哮喘 - 避免绒毛与粉尘材料";
        AdhdFriendly => "adhd_friendly", "多动症友好 - 安抚/专注类玩具";
        AutismFriendly => "autism_friendly", "孤独症友好 - 触觉/可预期类玩具";
        HearingAidCompatible => "hearing_aid_compatible", "助听器兼容 - 无线兼容";
        WheelchairAccessible => "wheelchair_accessible", "轮椅可用 - 尺寸/形态无障碍";
    }
}

requirement_enum! {
    /// 其他需求
    OtherRequirement, "未知其他需求" {
        EcoFriendly => "eco_friendly", "环保 - 可回收材料";
        Educational => "educational", "教育 - 益智启发";
        GenderNeutral => "gender_neutral", "性别中立 - 中性主题";
        Bilingual => "bilingual", "双语";
        Sustainable => "sustainable", "可持续 - 耐用可修复";
        CharitySupported => "charity_supported", "公益 - 部分收益用于慈善";
    }
}

// ==========================================
// 需求类别 (Requirement Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementCategory {
    Dietary,
    Safety,
    Medical,
    Other,
}

impl RequirementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementCategory::Dietary => "dietary",
            RequirementCategory::Safety => "safety",
            RequirementCategory::Medical => "medical",
            RequirementCategory::Other => "other",
        }
    }
}

impl fmt::Display for RequirementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Requirement - 单条需求（跨类别统一视图）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Requirement {
    Dietary(DietaryRequirement),
    Safety(SafetyRequirement),
    Medical(MedicalRequirement),
    Other(OtherRequirement),
}

impl Requirement {
    pub fn category(&self) -> RequirementCategory {
        match self {
            Requirement::Dietary(_) => RequirementCategory::Dietary,
            Requirement::Safety(_) => RequirementCategory::Safety,
            Requirement::Medical(_) => RequirementCategory::Medical,
            Requirement::Other(_) => RequirementCategory::Other,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Requirement::Dietary(r) => r.as_str(),
            Requirement::Safety(r) => r.as_str(),
            Requirement::Medical(r) => r.as_str(),
            Requirement::Other(r) => r.as_str(),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Requirement::Dietary(r) => r.description(),
            Requirement::Safety(r) => r.description(),
            Requirement::Medical(r) => r.description(),
            Requirement::Other(r) => r.description(),
        }
    }

    pub fn is_known(&self) -> bool {
        match self {
            Requirement::Dietary(r) => r.is_known(),
            Requirement::Safety(r) => r.is_known(),
            Requirement::Medical(r) => r.is_known(),
            Requirement::Other(r) => r.is_known(),
        }
    }

    /// 诊断用键: "<category>.<requirement>"
    pub fn key(&self) -> String {
        format!("{}.{}", self.category(), self.name())
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ==========================================
// SpecialRequirements - 儿童特殊需求集合
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialRequirements {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dietary: Vec<DietaryRequirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safety: Vec<SafetyRequirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub medical: Vec<MedicalRequirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other: Vec<OtherRequirement>,
}

impl SpecialRequirements {
    /// 空需求集合（常量，供无需求儿童借用）
    pub const EMPTY: SpecialRequirements = SpecialRequirements {
        dietary: Vec::new(),
        safety: Vec::new(),
        medical: Vec::new(),
        other: Vec::new(),
    };

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn count(&self) -> usize {
        self.dietary.len() + self.safety.len() + self.medical.len() + self.other.len()
    }

    /// 按类别顺序展开全部需求
    pub fn iter(&self) -> impl Iterator<Item = Requirement> + '_ {
        self.dietary
            .iter()
            .cloned()
            .map(Requirement::Dietary)
            .chain(self.safety.iter().cloned().map(Requirement::Safety))
            .chain(self.medical.iter().cloned().map(Requirement::Medical))
            .chain(self.other.iter().cloned().map(Requirement::Other))
    }

    /// 检查是否包含指定需求
    pub fn has(&self, requirement: &Requirement) -> bool {
        match requirement {
            Requirement::Dietary(r) => self.dietary.contains(r),
            Requirement::Safety(r) => self.safety.contains(r),
            Requirement::Medical(r) => self.medical.contains(r),
            Requirement::Other(r) => self.other.contains(r),
        }
    }

    /// 各类别需求数量（仅包含非空类别）
    pub fn counts_by_category(&self) -> BTreeMap<RequirementCategory, usize> {
        let mut counts = BTreeMap::new();
        for requirement in self.iter() {
            *counts.entry(requirement.category()).or_insert(0) += 1;
        }
        counts
    }

    /// 未识别的需求（"<category>.<name>"）
    pub fn unknown(&self) -> Vec<String> {
        self.iter()
            .filter(|r| !r.is_known())
            .map(|r| r.key())
            .collect()
    }

    /// 人类可读摘要，例如 "dietary: vegan, halal; safety: no_small_parts"
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "无特殊需求".to_string();
        }

        let mut grouped: BTreeMap<RequirementCategory, Vec<String>> = BTreeMap::new();
        for requirement in self.iter() {
            grouped
                .entry(requirement.category())
                .or_default()
                .push(requirement.name().to_string());
        }

        grouped
            .into_iter()
            .map(|(category, names)| format!("{}: {}", category, names.join(", ")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_and_unknown() {
        assert_eq!(DietaryRequirement::parse("Vegan"), DietaryRequirement::Vegan);
        assert_eq!(
            MedicalRequirement::parse("night_terrors"),
            MedicalRequirement::Unknown("night_terrors".to_string())
        );
        assert!(!OtherRequirement::parse("x").is_known());
    }

    #[test]
    fn test_deserialize_from_strings() {
        let json = r#"{"dietary":["vegan","halal"],"safety":["no_small_parts"],"other":["space_theme"]}"#;
        let reqs: SpecialRequirements = serde_json::from_str(json).unwrap();

        assert_eq!(reqs.dietary, vec![DietaryRequirement::Vegan, DietaryRequirement::Halal]);
        assert_eq!(reqs.safety, vec![SafetyRequirement::NoSmallParts]);
        assert!(reqs.medical.is_empty());
        assert_eq!(reqs.unknown(), vec!["other.space_theme".to_string()]);
        assert_eq!(reqs.count(), 4);
    }

    #[test]
    fn test_serialize_back_to_names() {
        let reqs = SpecialRequirements {
            medical: vec![MedicalRequirement::Epilepsy],
            ..Default::default()
        };
        let json = serde_json::to_string(&reqs).unwrap();
        assert_eq!(json, r#"{"medical":["epilepsy"]}"#);
    }

    #[test]
    fn test_counts_and_summary() {
        let reqs = SpecialRequirements {
            dietary: vec![DietaryRequirement::Vegan, DietaryRequirement::Halal],
            safety: vec![SafetyRequirement::Washable],
            ..Default::default()
        };

        let counts = reqs.counts_by_category();
        assert_eq!(counts.get(&RequirementCategory::Dietary), Some(&2));
        assert_eq!(counts.get(&RequirementCategory::Safety), Some(&1));
        assert_eq!(counts.get(&RequirementCategory::Medical), None);
        assert_eq!(reqs.summary(), "dietary: vegan, halal; safety: washable");
        assert_eq!(SpecialRequirements::EMPTY.summary(), "无特殊需求");
    }

    #[test]
    fn test_requirement_key() {
        let req = Requirement::Safety(SafetyRequirement::BpaFree);
        assert_eq!(req.key(), "safety.bpa_free");
        assert_eq!(req.category(), RequirementCategory::Safety);
    }
}
