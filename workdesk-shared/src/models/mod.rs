/// Database models
///
/// Each model owns its SQL. Functions are generic over `sqlx::Executor` so the
/// same call works against the pool or inside a transaction (`&mut *tx`).
///
/// - [`user`]: staff accounts and roles
/// - [`client`]: external client companies
/// - [`task`]: work items and the scoped list query
/// - [`attachment`]: file metadata bound to a task

pub mod attachment;
pub mod client;
pub mod task;
pub mod user;

pub use attachment::{Attachment, AttachmentListItem, CreateAttachment};
pub use client::{Client, ClientFields, ClientFilter, ClientStatus};
pub use task::{CreateTask, Task, TaskFilter, TaskListItem, TaskPriority, TaskStatus, UpdateTask};
pub use user::{CreateUser, Role, User, UserSummary};
