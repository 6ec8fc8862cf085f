//! 统一错误处理 - 配置校验错误

/// 溢出分片表可能发生的错误
///
/// 读写操作本身不会失败，键不存在通过返回值表达。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpillError {
    #[error("无效配置: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

impl SpillError {
    /// 获取错误恢复建议
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InvalidConfig { .. } => Some("检查配置参数，或使用会自动修正的构造函数"),
        }
    }

    /// 判断错误是否可恢复
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }
}
