// ==========================================
// 礼品分配系统 - 数据文件加载器
// ==========================================
// 职责: 读取 JSON 数据文件 → 边界校验 → 构建只读仓储
// 格式: 包装对象 {"children": [...]} 或裸数组 [...] 均可
// 红线: 任何无效记录 → 致命错误, 批次不启动
// ==========================================

use crate::domain::catalog::CatalogItem;
use crate::domain::child::Child;
use crate::domain::region::Region;
use crate::domain::report::DataFiles;
use crate::domain::wish::Wish;
use crate::engine::repositories::GiftRepositories;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::{
    InMemoryChildRepository, InMemoryGiftRepository, InMemoryRegionRepository, InMemoryWishRepository,
    WishRepository,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const CHILDREN_FILE: &str = "children.json";
pub const CATALOG_FILE: &str = "catalog.json";
pub const WISHES_FILE: &str = "wishes.json";
pub const REGIONS_FILE: &str = "regions.json";

// ==========================================
// 文件外形
// ==========================================
#[derive(Deserialize)]
#[serde(untagged)]
enum ChildrenFile {
    Wrapped { children: Vec<Child> },
    Bare(Vec<Child>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Wrapped { items: Vec<CatalogItem> },
    Bare(Vec<CatalogItem>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WishesFile {
    Wrapped { wishes: Vec<Wish> },
    Bare(Vec<Wish>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RegionsFile {
    Wrapped { regions: Vec<Region> },
    Bare(Vec<Region>),
}

// ==========================================
// DataSources - 数据文件路径
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct DataSources {
    pub children: PathBuf,
    pub catalog: PathBuf,
    /// 缺省或文件不存在 → 跳过愿望阶段
    pub wishes: Option<PathBuf>,
    /// 缺省或文件不存在 → 全部使用默认系数
    pub regions: Option<PathBuf>,
}

impl DataSources {
    /// 数据目录下的标准文件名
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            children: dir.join(CHILDREN_FILE),
            catalog: dir.join(CATALOG_FILE),
            wishes: Some(dir.join(WISHES_FILE)),
            regions: Some(dir.join(REGIONS_FILE)),
        }
    }

    /// 报告中记录的文件名
    pub fn data_files(&self) -> DataFiles {
        fn name(path: &Path) -> String {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        }

        DataFiles {
            children: Some(name(&self.children)),
            catalog: Some(name(&self.catalog)),
            wishes: self.wishes.as_deref().map(name),
            regions: self.regions.as_deref().map(name),
        }
    }
}

// ==========================================
// LoadedData - 已校验的数据集
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct LoadedData {
    pub children: Vec<Child>,
    pub catalog: Vec<CatalogItem>,
    /// None = 愿望文件缺省
    pub wishes: Option<Vec<Wish>>,
    pub regions: Vec<Region>,
    /// 非致命提示（未识别需求、缺省文件等）
    pub warnings: Vec<String>,
}

impl LoadedData {
    /// 构建只读仓储集合
    pub fn into_repositories(self) -> GiftRepositories {
        let wishes = self
            .wishes
            .map(|w| Arc::new(InMemoryWishRepository::new(w)) as Arc<dyn WishRepository>);

        GiftRepositories::new(
            Arc::new(InMemoryChildRepository::new(self.children)),
            Arc::new(InMemoryGiftRepository::new(self.catalog)),
            wishes,
            Arc::new(InMemoryRegionRepository::new(self.regions)),
        )
    }
}

// ==========================================
// DataLoader - 数据文件加载器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct DataLoader {
    /// 严格模式: 未识别的需求名称视为错误
    strict: bool,
}

impl DataLoader {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// 加载并校验全部数据文件
    #[instrument(skip(self, sources), fields(strict = self.strict))]
    pub async fn load(&self, sources: &DataSources) -> ImportResult<LoadedData> {
        let mut warnings = Vec::new();

        let children = match read_json::<ChildrenFile>(&sources.children).await? {
            ChildrenFile::Wrapped { children } | ChildrenFile::Bare(children) => children,
        };
        let catalog = match read_json::<CatalogFile>(&sources.catalog).await? {
            CatalogFile::Wrapped { items } | CatalogFile::Bare(items) => items,
        };

        let wishes = match read_optional::<WishesFile>(sources.wishes.as_deref(), &mut warnings).await? {
            Some(WishesFile::Wrapped { wishes }) | Some(WishesFile::Bare(wishes)) => Some(wishes),
            None => None,
        };
        let regions = match read_optional::<RegionsFile>(sources.regions.as_deref(), &mut warnings).await? {
            Some(RegionsFile::Wrapped { regions }) | Some(RegionsFile::Bare(regions)) => regions,
            None => Vec::new(),
        };

        let data = LoadedData {
            children,
            catalog,
            wishes,
            regions,
            warnings,
        };
        let data = self.validate(data, sources)?;

        info!(
            children = data.children.len(),
            catalog = data.catalog.len(),
            wishes = data.wishes.as_ref().map(Vec::len),
            regions = data.regions.len(),
            warnings = data.warnings.len(),
            "数据加载完成"
        );
        Ok(data)
    }

    /// 边界校验
    ///
    /// # 规则
    /// - 儿童/商品/愿望/地区逐条 validate
    /// - 儿童ID、商品ID唯一
    /// - 未识别需求: 宽松模式记录警告, 严格模式报错
    pub fn validate(&self, mut data: LoadedData, sources: &DataSources) -> ImportResult<LoadedData> {
        let file = |path: &Path| path.display().to_string();

        let mut seen = HashSet::new();
        for child in &data.children {
            child.validate().map_err(|message| ImportError::ValidationError {
                file: file(&sources.children),
                message,
            })?;
            if !seen.insert(child.id) {
                return Err(ImportError::DuplicateId {
                    entity: "child".to_string(),
                    id: child.id,
                });
            }

            let unknown = child.requirements().unknown();
            if !unknown.is_empty() {
                if self.strict {
                    return Err(ImportError::UnknownRequirement {
                        child_id: child.id,
                        requirements: unknown.join(", "),
                    });
                }
                warn!(child_id = child.id, unknown = ?unknown, "未识别的特殊需求, 按通过处理");
                data.warnings.push(format!(
                    "儿童 {} 含未识别的特殊需求: {}",
                    child.id,
                    unknown.join(", ")
                ));
            }
        }

        let mut seen = HashSet::new();
        for item in &data.catalog {
            item.validate().map_err(|message| ImportError::ValidationError {
                file: file(&sources.catalog),
                message,
            })?;
            if !seen.insert(item.id) {
                return Err(ImportError::DuplicateId {
                    entity: "catalog_item".to_string(),
                    id: item.id,
                });
            }
        }

        if let (Some(wishes), Some(path)) = (&data.wishes, &sources.wishes) {
            for wish in wishes {
                wish.validate().map_err(|message| ImportError::ValidationError {
                    file: file(path),
                    message,
                })?;
            }
        }

        if let Some(path) = &sources.regions {
            for region in &data.regions {
                region.validate().map_err(|message| ImportError::ValidationError {
                    file: file(path),
                    message,
                })?;
            }
        }

        Ok(data)
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> ImportResult<T> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        Err(e) => {
            return Err(ImportError::FileReadError(format!("{}: {}", path.display(), e)));
        }
    };

    serde_json::from_slice(&bytes).map_err(|e| ImportError::JsonParseError {
        file: path.display().to_string(),
        message: e.to_string(),
    })
}

/// 可选文件: 路径缺省或文件不存在 → None
async fn read_optional<T: DeserializeOwned>(
    path: Option<&Path>,
    warnings: &mut Vec<String>,
) -> ImportResult<Option<T>> {
    let Some(path) = path else {
        return Ok(None);
    };

    match read_json(path).await {
        Ok(value) => Ok(Some(value)),
        Err(ImportError::FileNotFound(p)) => {
            info!(path = %p, "可选数据文件不存在, 跳过");
            warnings.push(format!("可选数据文件不存在: {}", p));
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_sources_in_dir() {
        let sources = DataSources::in_dir("/data/run");
        assert_eq!(sources.children, PathBuf::from("/data/run/children.json"));

        let files = sources.data_files();
        assert_eq!(files.children.as_deref(), Some("children.json"));
        assert_eq!(files.regions.as_deref(), Some("regions.json"));
    }

    #[test]
    fn test_wrapped_and_bare_shapes() {
        let wrapped: CatalogFile = serde_json::from_str(
            r#"{"items": [{"id": 1, "name": "Мяч", "category": "toys", "price": 3.5, "weight": 0.2}],
                "categories": ["toys"], "metadata": {"version": "1"}}"#,
        )
        .unwrap();
        let bare: CatalogFile = serde_json::from_str(
            r#"[{"id": 1, "name": "Мяч", "category": "toys", "price": 3.5, "weight": 0.2}]"#,
        )
        .unwrap();

        for file in [wrapped, bare] {
            let items = match file {
                CatalogFile::Wrapped { items } | CatalogFile::Bare(items) => items,
            };
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].min_age, 0);
        }
    }
}
