//! 配置管理模块
//!
//! 提供CLI参数解析和镜像运行配置管理功能

// 标准库导入
use std::path::{Path, PathBuf};

// 第三方crate导入
use clap::Parser;
use url::Url;

// 本地模块导入
use crate::api_constants::{crawler_config, is_valid_http_url, service_config};
use crate::error::Result;
use crate::mirror_error;

/// 镜像运行配置结构体
///
/// 一次运行只对应一个起始站点，所有组件共享同一份配置。
/// 支持Builder模式进行链式配置。
///
/// # Examples
///
/// ```rust
/// use site_mirror::config::MirrorConfig;
///
/// let config = MirrorConfig::new()
///     .with_start_url("https://example.test")
///     .with_output_dir("pages")
///     .target_language("hi")
///     .with_batch_size(4);
/// assert_eq!(config.origin().unwrap(), "https://example.test");
/// ```
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// 起始页面URL
    start_url: String,
    /// 镜像根目录
    output_dir: PathBuf,
    /// 静态资源（样式表、脚本）改写后指向的主机，未设置时使用起始站点
    asset_host: Option<String>,
    /// 翻译API服务地址
    api_url: String,
    /// 源语言代码
    source_lang: String,
    /// 目标语言代码
    target_lang: String,
    /// 每批次最多文本条数
    batch_size: usize,
    /// 批次拼接长度上限
    max_batch_chars: usize,
    /// 批次分隔符
    separator: String,
    /// 请求超时（秒）
    timeout_secs: u64,
    /// 用户代理字符串
    user_agent: String,
}

impl MirrorConfig {
    /// 创建新的配置实例
    ///
    /// 返回具有默认值的配置实例：
    /// - 起始URL: classcentral首页
    /// - 镜像目录: `pages`
    /// - 语言: en -> hi
    /// - 批处理: 每批4条，拼接长度上限235，分隔符 `|-|`
    /// - 请求超时: 30秒
    pub fn new() -> Self {
        Self {
            start_url: crawler_config::DEFAULT_START_URL.to_string(),
            output_dir: PathBuf::from(crawler_config::DEFAULT_MIRROR_DIR),
            asset_host: None,
            api_url: service_config::DEFAULT_API_URL.to_string(),
            source_lang: service_config::DEFAULT_SOURCE_LANG.to_string(),
            target_lang: service_config::DEFAULT_TARGET_LANG.to_string(),
            batch_size: service_config::DEFAULT_BATCH_SIZE,
            max_batch_chars: service_config::DEFAULT_MAX_BATCH_CHARS,
            separator: service_config::DEFAULT_SEPARATOR.to_string(),
            timeout_secs: crawler_config::REQUEST_TIMEOUT_SECONDS,
            user_agent: crawler_config::DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// 从命令行参数构建配置
    pub fn from_cli(cli: &Cli) -> Self {
        let mut config = Self::new()
            .with_start_url(&cli.url)
            .with_output_dir(&cli.output_dir)
            .with_api_url(&cli.api)
            .source_language(&cli.source_lang)
            .target_language(&cli.target_lang)
            .with_batch_size(cli.batch_size)
            .with_max_batch_chars(cli.max_batch_chars)
            .with_timeout(cli.timeout);

        if let Some(host) = &cli.asset_host {
            config = config.with_asset_host(host);
        }
        if let Some(agent) = &cli.user_agent {
            config = config.with_user_agent(agent);
        }
        config
    }

    /// 获取起始URL
    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    /// 获取起始站点的源（`scheme://host[:port]`，不带结尾斜杠）
    ///
    /// 该字符串即站内绝对引用中需要剥离的部分。
    pub fn origin(&self) -> Result<String> {
        let url = Url::parse(&self.start_url)?;
        let origin = url.origin().ascii_serialization();
        if origin == "null" {
            return Err(mirror_error!(config, "start_url", "无法确定起始站点的源"));
        }
        Ok(origin)
    }

    /// 获取静态资源主机，未设置时回落到起始站点的源
    pub fn asset_host(&self) -> Result<String> {
        match &self.asset_host {
            Some(host) => Ok(host.trim_end_matches('/').to_string()),
            None => self.origin(),
        }
    }

    /// 获取镜像根目录
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 获取API地址
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// 获取源语言代码
    pub fn source_lang(&self) -> &str {
        &self.source_lang
    }

    /// 获取目标语言代码
    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    /// 获取批处理大小
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// 获取批次拼接长度上限
    pub fn max_batch_chars(&self) -> usize {
        self.max_batch_chars
    }

    /// 获取批次分隔符
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// 获取请求超时（秒）
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// 获取用户代理
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// 设置起始URL
    pub fn with_start_url(mut self, url: &str) -> Self {
        self.start_url = url.trim().to_string();
        self
    }

    /// 设置镜像根目录
    pub fn with_output_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// 设置静态资源主机
    pub fn with_asset_host(mut self, host: &str) -> Self {
        self.asset_host = Some(host.trim().to_string());
        self
    }

    /// 设置API地址
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }

    /// 设置源语言代码
    pub fn source_language(mut self, lang: &str) -> Self {
        self.source_lang = lang.to_string();
        self
    }

    /// 设置目标语言代码
    pub fn target_language(mut self, lang: &str) -> Self {
        self.target_lang = lang.to_string();
        self
    }

    /// 设置批处理大小
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// 设置批次拼接长度上限
    pub fn with_max_batch_chars(mut self, chars: usize) -> Self {
        self.max_batch_chars = chars;
        self
    }

    /// 设置批次分隔符
    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    /// 设置请求超时
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    /// 设置用户代理
    pub fn with_user_agent(mut self, agent: &str) -> Self {
        self.user_agent = agent.to_string();
        self
    }

    /// 校验配置是否可用
    pub fn validate(&self) -> Result<()> {
        if !is_valid_http_url(&self.start_url) {
            return Err(mirror_error!(config, "start_url", "URL必须以http://或https://开头"));
        }
        self.origin()?;

        if let Some(host) = &self.asset_host {
            if !is_valid_http_url(host) {
                return Err(mirror_error!(config, "asset_host", "资源主机必须以http://或https://开头"));
            }
        }
        if !is_valid_http_url(&self.api_url) {
            return Err(mirror_error!(config, "api_url", "API地址必须以http://或https://开头"));
        }
        if self.batch_size == 0 {
            return Err(mirror_error!(config, "batch_size", "批处理大小必须大于0"));
        }
        if self.max_batch_chars == 0 {
            return Err(mirror_error!(config, "max_batch_chars", "批次长度上限必须大于0"));
        }
        if self.separator.trim().is_empty() {
            return Err(mirror_error!(config, "separator", "分隔符不能为空白"));
        }
        if self.timeout_secs == 0 {
            return Err(mirror_error!(config, "timeout", "超时时间必须大于0"));
        }
        Ok(())
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// CLI参数结构
///
/// 所有参数均有默认值，不带参数运行即镜像默认站点。
#[derive(Parser, Debug)]
#[command(author, version, about = "网站镜像翻译工具 - 镜像首页及一级页面并整页翻译", long_about = None)]
pub struct Cli {
    /// 起始页面URL
    #[arg(short, long, default_value = crawler_config::DEFAULT_START_URL)]
    pub url: String,

    /// 镜像输出根目录
    #[arg(short, long, value_name = "DIR", default_value = crawler_config::DEFAULT_MIRROR_DIR)]
    pub output_dir: PathBuf,

    /// 样式表/脚本改写后指向的主机 (默认与起始站点相同)
    #[arg(long, value_name = "URL")]
    pub asset_host: Option<String>,

    /// 翻译API地址
    #[arg(short, long, default_value = service_config::DEFAULT_API_URL)]
    pub api: String,

    /// 源语言代码
    #[arg(long, default_value = service_config::DEFAULT_SOURCE_LANG)]
    pub source_lang: String,

    /// 目标语言代码 (如: hi, zh, ja)
    #[arg(short = 'l', long, default_value = service_config::DEFAULT_TARGET_LANG)]
    pub target_lang: String,

    /// 每批次文本条数
    #[arg(long, default_value_t = service_config::DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// 批次拼接长度上限，达到即逐条翻译
    #[arg(long, default_value_t = service_config::DEFAULT_MAX_BATCH_CHARS)]
    pub max_batch_chars: usize,

    /// 请求超时时间（秒）
    #[arg(long, default_value_t = crawler_config::REQUEST_TIMEOUT_SECONDS)]
    pub timeout: u64,

    /// 自定义User-Agent
    #[arg(long)]
    pub user_agent: Option<String>,

    /// 详细输出模式
    #[arg(short, long)]
    pub verbose: bool,

    /// 静默模式 (不输出日志)
    #[arg(short, long)]
    pub quiet: bool,

    /// 显示运行统计
    #[arg(long)]
    pub stats: bool,
}
