use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 网络请求失败（连接、超时等），原样交给调用方决定是否重试
    #[error("网络请求失败 ({endpoint}): {message}")]
    Network { endpoint: String, message: String },

    /// 响应不是合法 JSON
    #[error("响应解析失败 ({endpoint}): {raw}")]
    Protocol { endpoint: String, raw: String },

    /// 响应是 JSON，但缺少约定字段
    #[error("响应结构异常 ({endpoint}): 缺少 {path}")]
    UnexpectedShape { endpoint: String, path: String },

    /// HTTP 状态码异常
    #[error("HTTP 状态异常 ({endpoint}): {status}")]
    BadStatus { endpoint: String, status: u16 },

    /// 签名或验证码服务错误
    #[error("{oracle} 服务错误: {message}")]
    Oracle { oracle: String, message: String },

    /// 账号会话初始化失败
    #[error("会话初始化失败: {0}")]
    Session(String),

    /// 推送服务错误
    #[error("[{channel}] 推送错误: {message}")]
    Push { channel: String, message: String },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 文件操作错误
    #[error("文件操作失败 ({path}): {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件解析失败
    #[error("配置文件 {path} 解析失败: {message}")]
    ParseFailed { path: String, message: String },

    /// 缺少必要字段
    #[error("用户[{username}] 缺少必要字段: {field}")]
    MissingField { username: String, field: String },

    /// 推送配置无效
    #[error("用户[{username}] 推送配置无效: {message}")]
    InvalidPush { username: String, message: String },

    /// Cookies 文件无效
    #[error("用户[{username}] 的 cookies 文件 {path} 无效: {message}")]
    InvalidCookies {
        username: String,
        path: String,
        message: String,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "未知地址".to_string());
        AppError::Network {
            endpoint,
            message: err.to_string(),
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建网络错误
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Network {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// 创建响应解析错误
    pub fn protocol(endpoint: impl Into<String>, raw: impl Into<String>) -> Self {
        AppError::Protocol {
            endpoint: endpoint.into(),
            raw: raw.into(),
        }
    }

    /// 创建响应结构错误
    pub fn unexpected_shape(endpoint: impl Into<String>, path: impl Into<String>) -> Self {
        AppError::UnexpectedShape {
            endpoint: endpoint.into(),
            path: path.into(),
        }
    }

    /// 创建外部服务错误
    pub fn oracle(oracle: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Oracle {
            oracle: oracle.into(),
            message: message.into(),
        }
    }

    /// 创建推送错误
    pub fn push(channel: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Push {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// 创建文件错误
    pub fn file(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File {
            path: path.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
