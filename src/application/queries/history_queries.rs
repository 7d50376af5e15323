//! History Queries

/// 列出全部变声任务查询
#[derive(Debug, Clone)]
pub struct ListHistory;
