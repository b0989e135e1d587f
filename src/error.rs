//! 统一错误处理模块
//!
//! 提供站点镜像项目的统一错误类型定义和处理机制

// 标准库导入
use std::fmt;
use std::io;

/// 站点镜像统一错误类型
///
/// 定义了抓取、解析、落盘和翻译过程中可能出现的所有错误类型
#[derive(Debug)]
pub enum MirrorError {
    /// 网络请求相关错误（超时、连接失败、非2xx状态）
    Network {
        /// 错误消息
        message: String,
        /// HTTP状态码（如果适用）
        status_code: Option<u16>
    },

    /// HTML解析或序列化相关错误
    HtmlParse {
        /// 具体错误信息
        details: String
    },

    /// 文件操作相关错误
    FileOperation {
        /// 文件路径
        path: String,
        /// 操作类型（创建目录、写入等）
        operation: String,
        /// 底层IO错误
        source: io::Error
    },

    /// 翻译API相关错误
    TranslationApi {
        /// API响应状态码
        status_code: u16,
        /// 错误消息
        message: String,
        /// API地址
        api_url: String
    },

    /// 配置相关错误
    Configuration {
        /// 配置项名称
        field: String,
        /// 错误原因
        reason: String
    },

    /// 输入验证错误（例如不受支持的引用）
    InputValidation {
        /// 输入值
        input: String,
        /// 验证失败原因
        reason: String
    },
}

impl fmt::Display for MirrorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirrorError::Network { message, status_code } => {
                if let Some(code) = status_code {
                    write!(f, "网络请求失败 [{}]: {}", code, message)
                } else {
                    write!(f, "网络请求失败: {}", message)
                }
            },
            MirrorError::HtmlParse { details } => {
                write!(f, "HTML解析失败: {}", details)
            },
            MirrorError::FileOperation { path, operation, source } => {
                write!(f, "文件{}操作失败 [{}]: {}", operation, path, source)
            },
            MirrorError::TranslationApi { status_code, message, api_url } => {
                write!(f, "翻译API错误 [{}] {}: {}", status_code, api_url, message)
            },
            MirrorError::Configuration { field, reason } => {
                write!(f, "配置错误 [{}]: {}", field, reason)
            },
            MirrorError::InputValidation { input, reason } => {
                write!(f, "输入验证失败 [{}]: {}", input, reason)
            },
        }
    }
}

impl std::error::Error for MirrorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MirrorError::FileOperation { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// 站点镜像结果类型别名
pub type Result<T> = std::result::Result<T, MirrorError>;

/// 便捷的错误创建宏
#[macro_export]
macro_rules! mirror_error {
    (network, $msg:expr) => {
        $crate::error::MirrorError::Network {
            message: $msg.to_string(),
            status_code: None
        }
    };
    (network, $msg:expr, $code:expr) => {
        $crate::error::MirrorError::Network {
            message: $msg.to_string(),
            status_code: Some($code)
        }
    };
    (html_parse, $details:expr) => {
        $crate::error::MirrorError::HtmlParse {
            details: $details.to_string()
        }
    };
    (file_op, $path:expr, $op:expr, $source:expr) => {
        $crate::error::MirrorError::FileOperation {
            path: $path.to_string(),
            operation: $op.to_string(),
            source: $source
        }
    };
    (translation_api, $code:expr, $msg:expr, $url:expr) => {
        $crate::error::MirrorError::TranslationApi {
            status_code: $code,
            message: $msg.to_string(),
            api_url: $url.to_string()
        }
    };
    (config, $field:expr, $reason:expr) => {
        $crate::error::MirrorError::Configuration {
            field: $field.to_string(),
            reason: $reason.to_string()
        }
    };
    (input_validation, $input:expr, $reason:expr) => {
        $crate::error::MirrorError::InputValidation {
            input: $input.to_string(),
            reason: $reason.to_string()
        }
    };
}

/// 从reqwest::Error转换为MirrorError
impl From<reqwest::Error> for MirrorError {
    fn from(error: reqwest::Error) -> Self {
        let status_code = error.status().map(|s| s.as_u16());
        MirrorError::Network {
            message: error.to_string(),
            status_code,
        }
    }
}

/// 从url::ParseError转换为MirrorError
impl From<url::ParseError> for MirrorError {
    fn from(error: url::ParseError) -> Self {
        MirrorError::InputValidation {
            input: "url".to_string(),
            reason: error.to_string(),
        }
    }
}
