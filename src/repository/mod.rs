// ==========================================
// 礼品分配系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 定义引擎消费的只读数据端口 + 内存实现
// 约束: 运行期间数据只读, 内存实现无需加锁
// ==========================================

pub mod child_repo;
pub mod error;
pub mod gift_repo;
pub mod region_repo;
pub mod wish_repo;

// 重导出核心仓储
pub use child_repo::{ChildRepository, InMemoryChildRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use gift_repo::{GiftRepository, InMemoryGiftRepository};
pub use region_repo::{InMemoryRegionRepository, RegionRepository};
pub use wish_repo::{InMemoryWishRepository, WishRepository};
