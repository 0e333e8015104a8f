use std::sync::Arc;

use dashmap::DashMap;
use sqlx::SqlitePool;
use tokio::sync::broadcast;

use shared::message::SyncPayload;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::reservations::{Reconciler, ReservationService};

/// 资源版本管理器
///
/// 使用 DashMap 实现无锁并发的版本号管理。
/// 每种资源类型维护独立的版本号，支持原子递增，
/// 客户端可以通过版本号判断数据新旧。
#[derive(Debug)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    /// 创建空的版本管理器
    pub fn new() -> Self {
        Self {
            versions: DashMap::new(),
        }
    }

    /// 递增指定资源的版本号并返回新值
    ///
    /// 如果资源不存在，从 0 开始递增（返回 1）
    pub fn increment(&self, resource: &str) -> u64 {
        let mut entry = self.versions.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// 获取指定资源的当前版本号
    ///
    /// 如果资源不存在，返回 0
    pub fn get(&self, resource: &str) -> u64 {
        self.versions.get(resource).map(|v| *v).unwrap_or(0)
    }
}

impl Default for ResourceVersions {
    fn default() -> Self {
        Self::new()
    }
}

/// 同步广播中心
///
/// 资源变更通知的单一出口：版本号自动递增，经 broadcast channel 分发到
/// 所有 SSE 订阅者。没有订阅者时 send 失败是正常情况，直接忽略。
#[derive(Debug)]
pub struct SyncHub {
    versions: ResourceVersions,
    tx: broadcast::Sender<SyncPayload>,
}

impl SyncHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self {
            versions: ResourceVersions::new(),
            tx,
        }
    }

    /// 广播一条资源变更通知
    pub fn publish<T: serde::Serialize>(
        &self,
        resource: &str,
        action: &str,
        id: &str,
        data: Option<&T>,
    ) {
        let version = self.versions.increment(resource);
        let payload = SyncPayload {
            resource: resource.to_string(),
            version,
            action: action.to_string(),
            id: id.to_string(),
            data: data.and_then(|d| serde_json::to_value(d).ok()),
        };
        let _ = self.tx.send(payload);
    }

    /// 订阅变更通知 (SSE endpoint)
    pub fn subscribe(&self) -> broadcast::Receiver<SyncPayload> {
        self.tx.subscribe()
    }

    /// 当前资源版本号
    pub fn version(&self, resource: &str) -> u64 {
        self.versions.get(resource)
    }
}

impl Default for SyncHub {
    fn default() -> Self {
        Self::new()
    }
}

/// 服务器状态 - 持有所有服务的单例引用
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | SQLite 连接池 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | reservations | ReservationService | 预订生命周期服务 |
/// | reconciler | Arc<Reconciler> | 对账调度器 |
/// | sync | Arc<SyncHub> | 资源变更广播 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub pool: SqlitePool,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
    /// 预订生命周期服务
    pub reservations: ReservationService,
    /// 对账调度器 (后台任务 + 管理员手动触发共享)
    pub reconciler: Arc<Reconciler>,
    /// 资源变更广播
    pub sync: Arc<SyncHub>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：工作目录结构 → 数据库 → 各服务。
    ///
    /// # Panics
    ///
    /// 数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("booking.db");
        let db_service = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");
        let pool = db_service.pool;

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let sync = Arc::new(SyncHub::new());
        let reservations = ReservationService::new(pool.clone());
        let reconciler = Arc::new(Reconciler::new(
            reservations.clone(),
            sync.clone(),
            config.reconcile_interval_secs,
            config.timezone,
        ));

        Self {
            config: config.clone(),
            pool,
            jwt_service,
            reservations,
            reconciler,
            sync,
        }
    }

    /// 广播资源变更通知
    ///
    /// # 参数
    /// - `resource`: 资源类型 (如 "reservation", "dining_table")
    /// - `action`: 变更类型 ("created", "updated", "cancelled", ...)
    /// - `id`: 资源 ID
    /// - `data`: 资源数据 (删除时为 None)
    pub fn broadcast_sync<T: serde::Serialize>(
        &self,
        resource: &str,
        action: &str,
        id: &str,
        data: Option<&T>,
    ) {
        self.sync.publish(resource, action, id, data);
    }
}
