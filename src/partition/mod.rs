// 파티션 수명 주기 관리 모듈
// 경계 계산, 카탈로그, 저장소 추상화 및 관리자를 담당합니다.

pub mod boundary;
pub mod catalog;
pub mod interval;
pub mod manager;
pub mod memory;
pub mod plan;
pub mod scheduler;
pub mod store;

// 외부로 노출할 항목들
pub use boundary::{CatalogEntry, KeyRange, PartitionBound, PartitionBoundary};
pub use catalog::PartitionCatalog;
pub use interval::IntervalWidth;
pub use manager::{CreatedBoundaries, PartitionManager, RetireMode, RetireResult};
pub use memory::MemoryStore;
pub use plan::{plan_coverage, Conflict, CoveragePlan, PartitionPolicy};
pub use store::PartitionStore;
